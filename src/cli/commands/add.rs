//! Add command implementation.

use crate::cli::Output;
use crate::context::{slugify, ContextInstance, Entity, EntityType, SaveMode};
use anyhow::{bail, Result};

/// Arguments to the add command.
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub entity_type: EntityType,
    pub name: String,
    pub id: Option<String>,
    pub sounds_like: Vec<String>,
    pub phrases: Vec<String>,
    pub topics: Vec<String>,
    pub destination: Option<String>,
}

/// Build the entity described by `args`.
fn build_entity(args: &AddArgs) -> Result<Entity> {
    let name = args.name.trim();
    if name.is_empty() {
        bail!("Name must not be empty");
    }

    let id = match &args.id {
        Some(id) => id.trim().to_string(),
        None => slugify(name),
    };
    if id.is_empty() {
        bail!("Could not derive an id from '{}'; pass --id", name);
    }

    let is_project = args.entity_type == EntityType::Project;
    if !is_project && (!args.phrases.is_empty() || !args.topics.is_empty() || args.destination.is_some()) {
        bail!("--phrase, --topic and --destination only apply to projects");
    }

    let sounds_like = args
        .sounds_like
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let mut entity = Entity::new(args.entity_type, id, name.to_string(), sounds_like);
    if let Entity::Project(project) = &mut entity {
        project.classification.explicit_phrases = args.phrases.clone();
        project.classification.topics = args.topics.clone();
        project.routing.destination = args.destination.clone();
    }

    Ok(entity)
}

/// Run the add command.
pub async fn run_add(ctx: &mut ContextInstance, args: AddArgs) -> Result<()> {
    let entity = build_entity(&args)?;
    let path = ctx.save_entity(entity, SaveMode::Create).await?;
    Output::success(&format!(
        "Added {} '{}' ({})",
        args.entity_type,
        args.name.trim(),
        path.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Identity;

    fn args(entity_type: EntityType, name: &str) -> AddArgs {
        AddArgs {
            entity_type,
            name: name.to_string(),
            id: None,
            sounds_like: vec![" pria ".to_string(), String::new()],
            phrases: vec![],
            topics: vec![],
            destination: None,
        }
    }

    #[test]
    fn test_id_defaults_to_slug() {
        let entity = build_entity(&args(EntityType::Person, "Priya Patel")).unwrap();
        assert_eq!(entity.id(), "priya-patel");
        assert_eq!(entity.sounds_like(), ["pria".to_string()]);
    }

    #[test]
    fn test_project_fields() {
        let mut a = args(EntityType::Project, "Walmart");
        a.phrases = vec!["walmart".to_string()];
        a.destination = Some("~/work/walmart".to_string());

        match build_entity(&a).unwrap() {
            Entity::Project(p) => {
                assert_eq!(p.classification.explicit_phrases, vec!["walmart"]);
                assert_eq!(p.routing.destination.as_deref(), Some("~/work/walmart"));
            }
            other => panic!("unexpected entity: {other:?}"),
        }
    }

    #[test]
    fn test_ignored_term_is_stamped() {
        match build_entity(&args(EntityType::Ignored, "um")).unwrap() {
            Entity::Ignored(term) => assert!(term.ignored_at.is_some()),
            other => panic!("unexpected entity: {other:?}"),
        }
    }

    #[test]
    fn test_project_flags_rejected_elsewhere() {
        let mut a = args(EntityType::Term, "Kubernetes");
        a.topics = vec!["infra".to_string()];
        assert!(build_entity(&a).is_err());
        assert!(build_entity(&args(EntityType::Term, "  ")).is_err());
    }
}
