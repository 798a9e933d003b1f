//! Edit command implementation.

use crate::cli::Output;
use crate::context::{ContextInstance, Entity, EntityType, Identity, SaveMode};
use crate::error::ProtokollError;
use anyhow::Result;

/// Arguments to the edit command.
#[derive(Debug, Clone, Default)]
pub struct EditArgs {
    pub name: Option<String>,
    pub add_sounds_like: Vec<String>,
    pub remove_sounds_like: Vec<String>,
    /// `Some(true)` to activate, `Some(false)` to deactivate.
    pub active: Option<bool>,
}

impl EditArgs {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.add_sounds_like.is_empty()
            && self.remove_sounds_like.is_empty()
            && self.active.is_none()
    }
}

/// Apply the identity updates in `args` to any entity.
fn apply(entity: &mut Entity, args: &EditArgs) {
    macro_rules! update {
        ($e:expr) => {{
            if let Some(name) = &args.name {
                $e.name = name.trim().to_string();
            }
            for variant in &args.add_sounds_like {
                let variant = variant.trim();
                if !variant.is_empty() && !$e.sounds_like.iter().any(|s| s.eq_ignore_ascii_case(variant)) {
                    $e.sounds_like.push(variant.to_string());
                }
            }
            $e.sounds_like
                .retain(|s| !args.remove_sounds_like.iter().any(|r| r.trim().eq_ignore_ascii_case(s)));
            if let Some(active) = args.active {
                $e.active = active;
            }
        }};
    }

    match entity {
        Entity::Person(e) => update!(e),
        Entity::Project(e) => update!(e),
        Entity::Company(e) => update!(e),
        Entity::Term(e) => update!(e),
        Entity::Ignored(e) => update!(e),
    }
}

fn lookup(ctx: &ContextInstance, entity_type: EntityType, id: &str) -> Option<Entity> {
    match entity_type {
        EntityType::Person => ctx.person(id).cloned().map(Entity::Person),
        EntityType::Project => ctx.project(id).cloned().map(Entity::Project),
        EntityType::Company => ctx.company(id).cloned().map(Entity::Company),
        EntityType::Term => ctx.term(id).cloned().map(Entity::Term),
        EntityType::Ignored => ctx.ignored_term(id).cloned().map(Entity::Ignored),
    }
}

/// Run the edit command.
pub async fn run_edit(
    ctx: &mut ContextInstance,
    entity_type: EntityType,
    id: &str,
    args: EditArgs,
) -> Result<()> {
    if args.is_empty() {
        Output::warning("Nothing to change.");
        return Ok(());
    }

    let Some(mut entity) = lookup(ctx, entity_type, id) else {
        // Resolve with typo tolerance only to produce a helpful message.
        let err = match ctx.find_any(Some(entity_type), id) {
            Ok(close) => ProtokollError::InvalidInput(format!(
                "No {} with id '{}'; did you mean '{}'?",
                entity_type,
                id,
                close.id()
            )),
            Err(e) => e,
        };
        return Err(err.into());
    };

    apply(&mut entity, &args);
    let path = ctx.save_entity(entity, SaveMode::Replace).await?;
    Output::success(&format!("Updated {} '{}' ({})", entity_type, id, path.display()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_updates_identity_fields() {
        let mut entity = Entity::new(
            EntityType::Company,
            "acme".to_string(),
            "Acme".to_string(),
            vec!["akme".to_string(), "ackme".to_string()],
        );
        let args = EditArgs {
            name: Some(" Acme Corp ".to_string()),
            add_sounds_like: vec!["AKME".to_string(), "acne".to_string()],
            remove_sounds_like: vec!["ackme".to_string()],
            active: Some(false),
        };

        apply(&mut entity, &args);

        assert_eq!(entity.name(), "Acme Corp");
        assert_eq!(entity.sounds_like(), ["akme".to_string(), "acne".to_string()]);
        assert!(!entity.is_active());
    }

    #[test]
    fn test_empty_args() {
        assert!(EditArgs::default().is_empty());
    }
}
