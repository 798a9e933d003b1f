//! Error types for Protokoll.

use crate::context::EntityType;
use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for Protokoll operations.
#[derive(Error, Debug)]
pub enum ProtokollError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("No entity matches '{query}'.{}", format_candidates(.candidates))]
    EntityNotFound {
        query: String,
        /// Every `(id, name)` pair that was searched.
        candidates: Vec<(String, String)>,
    },

    #[error("{entity_type} '{id}' already exists")]
    AlreadyExists { entity_type: EntityType, id: String },

    #[error("No context directory found. Run 'protokoll init' to create one.")]
    NoContext,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ProtokollError {
    /// Wrap a YAML error with the path of the offending document.
    pub fn parse(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        ProtokollError::Parse {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

fn format_candidates(candidates: &[(String, String)]) -> String {
    if candidates.is_empty() {
        return " The knowledge base has no entries of this kind.".to_string();
    }

    let mut out = String::from(" Available entries:");
    for (id, name) in candidates {
        out.push_str(&format!("\n  - {} ({})", id, name));
    }
    out.push_str("\nMatching is case-insensitive and tolerates small typos.");
    out
}

/// Result type alias for Protokoll operations.
pub type Result<T> = std::result::Result<T, ProtokollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_candidates() {
        let err = ProtokollError::EntityNotFound {
            query: "xyz".to_string(),
            candidates: vec![
                ("jane-smith".to_string(), "Jane Smith".to_string()),
                ("acme".to_string(), "Acme Corp".to_string()),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("No entity matches 'xyz'."));
        assert!(msg.contains("jane-smith (Jane Smith)"));
        assert!(msg.contains("acme (Acme Corp)"));
        assert!(msg.contains("case-insensitive"));
    }

    #[test]
    fn test_already_exists_message() {
        let err = ProtokollError::AlreadyExists {
            entity_type: EntityType::Person,
            id: "jane".to_string(),
        };
        assert_eq!(err.to_string(), "person 'jane' already exists");
    }
}
