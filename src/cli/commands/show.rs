//! Show command implementation.

use crate::cli::Output;
use crate::context::{ContextInstance, EntityType, Identity};
use anyhow::Result;

/// Run the show command.
pub fn run_show(ctx: &ContextInstance, entity_type: EntityType, query: &str) -> Result<()> {
    let entity = ctx.find_any(Some(entity_type), query)?;

    if entity.id() != query {
        Output::info(&format!("'{}' resolved to '{}'", query, entity.id()));
    }

    Output::header(&format!("{}: {}", entity_type, entity.name()));
    if let Some(origin) = ctx.origin(entity_type, entity.id()) {
        Output::kv("Defined in", &origin.path.display().to_string());
    }
    println!();
    print!("{}", entity.to_yaml()?);

    Ok(())
}
