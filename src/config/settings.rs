//! Configuration settings for Protokoll.

use crate::error::{ProtokollError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration structure.
///
/// Built from the deep-merged YAML documents of every discovered directory.
/// Keys outside the declared schema are kept in `extra` so that collaborators
/// reading their own sections still see them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub discovery: DiscoverySettings,
    pub finder: FinderSettings,
    pub routing: RoutingSettings,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Where and how far to look for context directories.
///
/// Only honoured from the base configuration file, since it decides which
/// directories get merged in the first place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Name of the marker directory searched for at each level.
    pub marker: String,
    /// Configuration file inside a marker directory.
    pub config_file: String,
    /// Knowledge directory inside a marker directory.
    pub context_dir: String,
    /// Maximum number of directories examined while walking upward.
    pub max_levels: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            marker: ".protokoll".to_string(),
            config_file: "config.yaml".to_string(),
            context_dir: "context".to_string(),
            max_levels: 10,
        }
    }
}

/// Resilient entity lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderSettings {
    /// Minimum similarity for a fuzzy candidate (0.0-1.0).
    pub threshold: f64,
}

impl Default for FinderSettings {
    fn default() -> Self {
        Self { threshold: 0.7 }
    }
}

/// Directory layout below a destination path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    /// Files go straight into the destination.
    None,
    /// `YYYY/`
    Year,
    /// `YYYY/MM/`
    #[default]
    Month,
    /// `YYYY/MM/DD/`
    Day,
}

impl std::str::FromStr for Structure {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "flat" => Ok(Structure::None),
            "year" => Ok(Structure::Year),
            "month" => Ok(Structure::Month),
            "day" => Ok(Structure::Day),
            _ => Err(format!("Unknown directory structure: {}", s)),
        }
    }
}

impl std::fmt::Display for Structure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Structure::None => write!(f, "none"),
            Structure::Year => write!(f, "year"),
            Structure::Month => write!(f, "month"),
            Structure::Day => write!(f, "day"),
        }
    }
}

/// Parts that make up a transcript file name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilenameOption {
    Date,
    Time,
    Subject,
}

/// How to pick between projects that score the same.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    /// The first project in configured order wins.
    #[default]
    Primary,
}

/// A destination as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DestinationSettings {
    /// Base directory (may start with `~`).
    pub path: String,
    pub structure: Structure,
    #[serde(alias = "filenameOptions")]
    pub filename_options: Vec<FilenameOption>,
}

impl Default for DestinationSettings {
    fn default() -> Self {
        Self {
            path: "~/notes".to_string(),
            structure: Structure::Month,
            filename_options: vec![
                FilenameOption::Date,
                FilenameOption::Time,
                FilenameOption::Subject,
            ],
        }
    }
}

/// Weight contributed by each kind of routing signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub explicit: f64,
    #[serde(alias = "soundsLike")]
    pub sounds_like: f64,
    pub topic: f64,
    pub person: f64,
    pub company: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            explicit: 0.9,
            sounds_like: 0.8,
            topic: 0.3,
            person: 0.6,
            company: 0.5,
        }
    }
}

/// Transcript routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Destination used when no project matches, and inherited by projects without one.
    pub default: DestinationSettings,
    #[serde(alias = "conflictResolution")]
    pub conflict_resolution: ConflictResolution,
    /// Minimum confidence a project needs before it is selected.
    #[serde(alias = "minConfidence")]
    pub min_confidence: f64,
    /// Project ids evaluated first, in this order.
    ///
    /// Unlisted projects follow, nearest context directory first and then by
    /// file name, so with an empty list equal scores resolve in file-name order.
    pub priority: Vec<String>,
    pub weights: SignalWeights,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            default: DestinationSettings::default(),
            conflict_resolution: ConflictResolution::Primary,
            min_confidence: 0.5,
            priority: Vec::new(),
            weights: SignalWeights::default(),
        }
    }
}

impl Settings {
    /// Build settings from a merged YAML document.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Settings::default());
        }
        serde_yaml::from_value(value).map_err(|e| ProtokollError::Config(e.to_string()))
    }

    /// Read the base configuration document.
    ///
    /// Uses `path` when given (it must exist), otherwise the user-level file
    /// if present. Returns `Value::Null` when there is nothing to read.
    pub fn load_base(path: Option<&Path>) -> Result<Value> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ProtokollError::Config(format!(
                        "Config file not found: {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => Self::default_config_path(),
        };

        if !config_path.exists() {
            return Ok(Value::Null);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let value: Value = serde_yaml::from_str(&content)
            .map_err(|e| ProtokollError::parse(&config_path, e))?;

        match value {
            Value::Null | Value::Mapping(_) => Ok(value),
            _ => Err(ProtokollError::Config(format!(
                "{} must contain a mapping at the top level",
                config_path.display()
            ))),
        }
    }

    /// Get the user-level configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("protokoll")
            .join("config.yaml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Render the settings as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_null() {
        let settings = Settings::from_value(Value::Null).unwrap();
        assert_eq!(settings.discovery.marker, ".protokoll");
        assert_eq!(settings.discovery.max_levels, 10);
        assert!((settings.finder.threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(settings.routing.default.structure, Structure::Month);
        assert_eq!(settings.routing.conflict_resolution, ConflictResolution::Primary);
    }

    #[test]
    fn test_partial_document_keeps_defaults_and_extras() {
        let value: Value = serde_yaml::from_str(
            r#"
routing:
  default:
    path: /srv/notes
    structure: day
  minConfidence: 0.4
model: gpt-4o
"#,
        )
        .unwrap();

        let settings = Settings::from_value(value).unwrap();
        assert_eq!(settings.routing.default.path, "/srv/notes");
        assert_eq!(settings.routing.default.structure, Structure::Day);
        assert_eq!(settings.routing.default.filename_options.len(), 3);
        assert!((settings.routing.min_confidence - 0.4).abs() < f64::EPSILON);
        assert!((settings.routing.weights.explicit - 0.9).abs() < f64::EPSILON);
        assert_eq!(
            settings.extra.get("model"),
            Some(&Value::String("gpt-4o".to_string()))
        );
    }

    #[test]
    fn test_invalid_enum_is_config_error() {
        let value: Value = serde_yaml::from_str("routing:\n  default:\n    structure: weekly\n").unwrap();
        let err = Settings::from_value(value).unwrap_err();
        assert!(matches!(err, ProtokollError::Config(_)));
    }

    #[test]
    fn test_parse_structure() {
        assert_eq!("month".parse::<Structure>().unwrap(), Structure::Month);
        assert_eq!("DAY".parse::<Structure>().unwrap(), Structure::Day);
        assert_eq!("flat".parse::<Structure>().unwrap(), Structure::None);
        assert!("weekly".parse::<Structure>().is_err());
    }

    #[test]
    fn test_load_base_explicit_missing_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(Settings::load_base(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_base_rejects_non_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "- a\n- b\n").unwrap();
        assert!(matches!(
            Settings::load_base(Some(&path)),
            Err(ProtokollError::Config(_))
        ));
    }
}
