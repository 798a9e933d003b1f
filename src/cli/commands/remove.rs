//! Remove command implementation.

use crate::cli::Output;
use crate::context::{ContextInstance, EntityType};
use anyhow::Result;

/// Run the remove command.
pub async fn run_remove(ctx: &mut ContextInstance, entity_type: EntityType, id: &str) -> Result<()> {
    let path = ctx.remove_entity(entity_type, id).await?;
    Output::success(&format!("Removed {} '{}' ({})", entity_type, id, path.display()));

    if ctx.origin(entity_type, id).is_some() {
        Output::info(&format!(
            "A definition of '{}' from a parent directory is now in effect.",
            id
        ));
    }

    Ok(())
}
