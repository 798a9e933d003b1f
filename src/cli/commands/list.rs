//! List command implementation.

use crate::cli::Output;
use crate::context::{ContextInstance, Entity, EntityType, Identity};
use anyhow::Result;

/// Run the list command.
pub fn run_list(ctx: &ContextInstance, entity_type: EntityType, include_inactive: bool) -> Result<()> {
    let entities: Vec<Entity> = ctx
        .search("")
        .into_iter()
        .filter(|e| e.entity_type() == entity_type)
        .filter(|e| include_inactive || e.is_active())
        .collect();

    if entities.is_empty() {
        Output::info(&format!(
            "No {} entries. Use 'protokoll add {} <name>' to add one.",
            entity_type, entity_type
        ));
        return Ok(());
    }

    Output::header(&format!("{} ({})", entity_type.dir_name(), entities.len()));
    println!();
    for entity in &entities {
        Output::entity(entity);
    }

    Ok(())
}
