//! Route destinations and output path composition.

use crate::config::{DestinationSettings, FilenameOption, Settings, Structure};
use crate::context::{slugify, ProjectRouting};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

/// Where a transcript should be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDestination {
    /// Base directory, with `~` expanded.
    pub path: PathBuf,
    pub structure: Structure,
    pub filename_options: Vec<FilenameOption>,
    /// Tags to attach to the transcript.
    pub auto_tags: Vec<String>,
}

impl RouteDestination {
    /// The engine-wide default destination.
    pub fn from_settings(settings: &DestinationSettings) -> Self {
        Self {
            path: Settings::expand_path(&settings.path),
            structure: settings.structure,
            filename_options: settings.filename_options.clone(),
            auto_tags: Vec::new(),
        }
    }

    /// Resolve a project's destination against the default.
    ///
    /// A configured destination wins, falling back to the default's structure
    /// and filename options only where the project leaves them unset. Without
    /// a destination the project inherits the default wholesale. Tags always
    /// come from the project.
    pub fn for_project(routing: &ProjectRouting, default: &DestinationSettings) -> Self {
        let configured = routing
            .destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        match configured {
            Some(path) => Self {
                path: Settings::expand_path(path),
                structure: routing.structure.unwrap_or(default.structure),
                filename_options: routing
                    .filename_options
                    .clone()
                    .unwrap_or_else(|| default.filename_options.clone()),
                auto_tags: routing.auto_tags.clone(),
            },
            None => Self {
                auto_tags: routing.auto_tags.clone(),
                ..Self::from_settings(default)
            },
        }
    }

    /// Directory a transcript recorded at `date` goes into.
    pub fn directory(&self, date: NaiveDateTime) -> PathBuf {
        let mut dir = self.path.clone();
        match self.structure {
            Structure::None => {}
            Structure::Year => {
                dir.push(date.format("%Y").to_string());
            }
            Structure::Month => {
                dir.push(date.format("%Y").to_string());
                dir.push(date.format("%m").to_string());
            }
            Structure::Day => {
                dir.push(date.format("%Y").to_string());
                dir.push(date.format("%m").to_string());
                dir.push(date.format("%d").to_string());
            }
        }
        dir
    }

    /// File name for a transcript, without directory.
    ///
    /// The date part only carries the components the directory structure
    /// does not already encode. Falls back to the hash prefix when no part
    /// applies.
    pub fn file_name(&self, date: NaiveDateTime, hash: &str, subject: Option<&str>) -> String {
        let mut parts: Vec<String> = Vec::new();

        for option in &self.filename_options {
            match option {
                FilenameOption::Date => {
                    let format = match self.structure {
                        Structure::None => Some("%Y-%m-%d"),
                        Structure::Year => Some("%m-%d"),
                        Structure::Month => Some("%d"),
                        Structure::Day => None,
                    };
                    if let Some(format) = format {
                        parts.push(date.format(format).to_string());
                    }
                }
                FilenameOption::Time => parts.push(date.format("%H%M").to_string()),
                FilenameOption::Subject => {
                    if let Some(slug) = subject.map(slugify).filter(|s| !s.is_empty()) {
                        parts.push(slug);
                    }
                }
            }
        }

        if parts.is_empty() {
            let short: String = hash.chars().take(8).collect();
            parts.push(if short.is_empty() {
                "transcript".to_string()
            } else {
                short
            });
        }

        format!("{}.md", parts.join("-"))
    }

    /// Full output path for a transcript.
    pub fn output_path(&self, date: NaiveDateTime, hash: &str, subject: Option<&str>) -> PathBuf {
        self.directory(date).join(self.file_name(date, hash, subject))
    }
}
