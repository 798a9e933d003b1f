//! Knowledge base entities.
//!
//! Each entity type lives in its own subdirectory of a context directory, one
//! YAML document per entity. All types share the identity fields used for
//! lookup and merging (`id`, `name`, `sounds_like`, `active`).

use crate::config::{FilenameOption, Structure};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The kinds of entity kept in a knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Project,
    Company,
    Term,
    Ignored,
}

impl EntityType {
    /// Every entity type, in listing order.
    pub const ALL: [EntityType; 5] = [
        EntityType::Person,
        EntityType::Project,
        EntityType::Company,
        EntityType::Term,
        EntityType::Ignored,
    ];

    /// Subdirectory holding this type's files.
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntityType::Person => "people",
            EntityType::Project => "projects",
            EntityType::Company => "companies",
            EntityType::Term => "terms",
            EntityType::Ignored => "ignored",
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "person" | "people" => Ok(EntityType::Person),
            "project" | "projects" => Ok(EntityType::Project),
            "company" | "companies" => Ok(EntityType::Company),
            "term" | "terms" => Ok(EntityType::Term),
            "ignored" | "ignore" | "ignored-term" => Ok(EntityType::Ignored),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Person => write!(f, "person"),
            EntityType::Project => write!(f, "project"),
            EntityType::Company => write!(f, "company"),
            EntityType::Term => write!(f, "term"),
            EntityType::Ignored => write!(f, "ignored term"),
        }
    }
}

/// Identity fields shared by every entity type.
pub trait Identity {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn sounds_like(&self) -> &[String];
    fn is_active(&self) -> bool;
}

/// A concrete entity type that can be stored in its own subdirectory.
pub trait EntityKind: Identity + Clone + Serialize + DeserializeOwned + Send + 'static {
    const TYPE: EntityType;

    fn into_entity(self) -> Entity;
}

fn default_active() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// A person who may be mentioned in recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Id of the company this person belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Free-form note on how this person relates to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, alias = "soundsLike", skip_serializing_if = "Vec::is_empty")]
    pub sounds_like: Vec<String>,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

/// Whether a project is work, personal, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    #[default]
    Work,
    Personal,
    Mixed,
}

/// Evidence used to recognise a transcript as belonging to a project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Classification {
    #[serde(alias = "contextType")]
    pub context_type: ContextType,
    /// Phrases that name the project outright.
    #[serde(alias = "explicitPhrases", skip_serializing_if = "Vec::is_empty")]
    pub explicit_phrases: Vec<String>,
    /// Keywords that hint at the project.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    /// Person ids whose mention points to this project.
    #[serde(alias = "associatedPeople", skip_serializing_if = "Vec::is_empty")]
    pub associated_people: Vec<String>,
    /// Company ids whose mention points to this project.
    #[serde(alias = "associatedCompanies", skip_serializing_if = "Vec::is_empty")]
    pub associated_companies: Vec<String>,
}

/// Where a project's transcripts are written.
///
/// Unset fields fall back to the default destination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectRouting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<Structure>,
    #[serde(alias = "filenameOptions", skip_serializing_if = "Option::is_none")]
    pub filename_options: Option<Vec<FilenameOption>>,
    #[serde(alias = "autoTags", skip_serializing_if = "Vec::is_empty")]
    pub auto_tags: Vec<String>,
}

/// A project transcripts can be routed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub routing: ProjectRouting,
    #[serde(default, alias = "soundsLike", skip_serializing_if = "Vec::is_empty")]
    pub sounds_like: Vec<String>,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

/// An organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, alias = "soundsLike", skip_serializing_if = "Vec::is_empty")]
    pub sounds_like: Vec<String>,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

/// Domain terminology, acronyms and jargon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Project ids this term is associated with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
    #[serde(default, alias = "soundsLike", skip_serializing_if = "Vec::is_empty")]
    pub sounds_like: Vec<String>,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

/// A phrase that should never be turned into an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoredTerm {
    pub id: String,
    /// The ignored phrase.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, alias = "ignoredAt", skip_serializing_if = "Option::is_none")]
    pub ignored_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "soundsLike", skip_serializing_if = "Vec::is_empty")]
    pub sounds_like: Vec<String>,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

macro_rules! impl_entity_kind {
    ($ty:ty, $variant:ident) => {
        impl Identity for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn sounds_like(&self) -> &[String] {
                &self.sounds_like
            }

            fn is_active(&self) -> bool {
                self.active
            }
        }

        impl EntityKind for $ty {
            const TYPE: EntityType = EntityType::$variant;

            fn into_entity(self) -> Entity {
                Entity::$variant(self)
            }
        }
    };
}

impl_entity_kind!(Person, Person);
impl_entity_kind!(Project, Project);
impl_entity_kind!(Company, Company);
impl_entity_kind!(Term, Term);
impl_entity_kind!(IgnoredTerm, Ignored);

/// Any entity in the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Person(Person),
    Project(Project),
    Company(Company),
    Term(Term),
    Ignored(IgnoredTerm),
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Person(_) => EntityType::Person,
            Entity::Project(_) => EntityType::Project,
            Entity::Company(_) => EntityType::Company,
            Entity::Term(_) => EntityType::Term,
            Entity::Ignored(_) => EntityType::Ignored,
        }
    }

    fn identity(&self) -> &dyn Identity {
        match self {
            Entity::Person(e) => e,
            Entity::Project(e) => e,
            Entity::Company(e) => e,
            Entity::Term(e) => e,
            Entity::Ignored(e) => e,
        }
    }

    /// Serialize the entity as a standalone YAML document.
    pub fn to_yaml(&self) -> crate::error::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Build a minimal entity of the given type.
    pub fn new(entity_type: EntityType, id: String, name: String, sounds_like: Vec<String>) -> Self {
        match entity_type {
            EntityType::Person => Entity::Person(Person {
                id,
                name,
                first_name: None,
                last_name: None,
                company: None,
                role: None,
                context: None,
                sounds_like,
                active: true,
            }),
            EntityType::Project => Entity::Project(Project {
                id,
                name,
                description: None,
                classification: Classification::default(),
                routing: ProjectRouting::default(),
                sounds_like,
                active: true,
            }),
            EntityType::Company => Entity::Company(Company {
                id,
                name,
                full_name: None,
                industry: None,
                sounds_like,
                active: true,
            }),
            EntityType::Term => Entity::Term(Term {
                id,
                name,
                expansion: None,
                domain: None,
                description: None,
                projects: Vec::new(),
                sounds_like,
                active: true,
            }),
            EntityType::Ignored => Entity::Ignored(IgnoredTerm {
                id,
                name,
                reason: None,
                ignored_at: Some(Utc::now()),
                sounds_like,
                active: true,
            }),
        }
    }
}

impl Identity for Entity {
    fn id(&self) -> &str {
        self.identity().id()
    }

    fn name(&self) -> &str {
        self.identity().name()
    }

    fn sounds_like(&self) -> &[String] {
        self.identity().sounds_like()
    }

    fn is_active(&self) -> bool {
        self.identity().is_active()
    }
}

/// Turn a display name into an entity id (`"Jane Smith"` -> `"jane-smith"`).
pub fn slugify(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let re = SEPARATORS.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug pattern"));
    re.replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Jane Smith"), "jane-smith");
        assert_eq!(slugify("  Acme, Inc. "), "acme-inc");
        assert_eq!(slugify("Q3 -- Planning!"), "q3-planning");
    }

    #[test]
    fn test_entity_type_parse_and_dirs() {
        assert_eq!("people".parse::<EntityType>().unwrap(), EntityType::Person);
        assert_eq!("Company".parse::<EntityType>().unwrap(), EntityType::Company);
        assert!("widget".parse::<EntityType>().is_err());
        assert_eq!(EntityType::Ignored.dir_name(), "ignored");
    }

    #[test]
    fn test_project_accepts_camel_case_fields() {
        let project: Project = serde_yaml::from_str(
            r#"
id: walmart
name: Walmart
soundsLike: [wall mart]
classification:
  contextType: work
  explicitPhrases: [walmart]
  topics: [retail]
routing:
  destination: ~/work/walmart
  filenameOptions: [date, subject]
  autoTags: [client]
"#,
        )
        .unwrap();

        assert!(project.active);
        assert_eq!(project.sounds_like, vec!["wall mart"]);
        assert_eq!(project.classification.explicit_phrases, vec!["walmart"]);
        assert_eq!(
            project.routing.filename_options,
            Some(vec![FilenameOption::Date, FilenameOption::Subject])
        );
        assert_eq!(project.routing.structure, None);
        assert_eq!(project.routing.auto_tags, vec!["client"]);
    }

    #[test]
    fn test_serialization_omits_defaults() {
        let entity = Entity::new(
            EntityType::Person,
            "jane-smith".to_string(),
            "Jane Smith".to_string(),
            vec![],
        );
        let yaml = entity.to_yaml().unwrap();
        assert_eq!(yaml, "id: jane-smith\nname: Jane Smith\n");
        assert_eq!(entity.entity_type(), EntityType::Person);
        assert!(entity.is_active());
    }
}
