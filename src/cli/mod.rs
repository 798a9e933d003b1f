//! CLI module for Protokoll.

pub mod commands;
mod output;

pub use output::Output;

use crate::context::EntityType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Protokoll - context-aware transcript routing
///
/// Keeps a directory-scoped knowledge base of people, projects, companies and
/// terms, and decides where a transcript belongs.
#[derive(Parser, Debug)]
#[command(name = "protokoll")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the user-level configuration file
    #[arg(short, long, global = true, env = "PROTOKOLL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to resolve context from (defaults to the current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a .protokoll directory with config and empty knowledge base
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show discovered context directories and entity counts
    Context,

    /// List entities of one type
    List {
        /// Entity type (person, project, company, term, ignored)
        entity_type: EntityType,

        /// Include inactive entities
        #[arg(short, long)]
        all: bool,
    },

    /// Show one entity, resolved with typo tolerance
    Show {
        /// Entity type (person, project, company, term, ignored)
        entity_type: EntityType,

        /// Id, name, or something close to either
        query: String,
    },

    /// Search every entity by id, name or sounds-like variant
    Search {
        /// Case-insensitive substring
        query: String,
    },

    /// Add an entity to the nearest context directory
    Add {
        /// Entity type (person, project, company, term, ignored)
        entity_type: EntityType,

        /// Display name
        name: String,

        /// Id (defaults to a slug of the name)
        #[arg(long)]
        id: Option<String>,

        /// Phonetic variant, may be repeated or comma separated
        #[arg(short, long = "sounds-like", value_delimiter = ',')]
        sounds_like: Vec<String>,

        /// Explicit phrase naming the project (projects only)
        #[arg(long = "phrase", value_delimiter = ',')]
        phrases: Vec<String>,

        /// Topic keyword (projects only)
        #[arg(long = "topic", value_delimiter = ',')]
        topics: Vec<String>,

        /// Destination directory (projects only)
        #[arg(long)]
        destination: Option<String>,
    },

    /// Update an existing entity
    Edit {
        /// Entity type (person, project, company, term, ignored)
        entity_type: EntityType,

        /// Exact id
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// Phonetic variant to add
        #[arg(long = "add-sounds-like", value_delimiter = ',')]
        add_sounds_like: Vec<String>,

        /// Phonetic variant to remove
        #[arg(long = "remove-sounds-like", value_delimiter = ',')]
        remove_sounds_like: Vec<String>,

        /// Mark the entity active
        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,

        /// Mark the entity inactive
        #[arg(long)]
        deactivate: bool,
    },

    /// Delete an entity defined in the nearest context directory
    Remove {
        /// Entity type (person, project, company, term, ignored)
        entity_type: EntityType,

        /// Exact id
        id: String,
    },

    /// Decide where a transcript belongs
    Route {
        /// Transcript text file
        file: PathBuf,

        /// Recording date (YYYY-MM-DD or "YYYY-MM-DD HH:MM"); defaults to the file's mtime
        #[arg(short, long)]
        date: Option<String>,

        /// Subject used in the file name (defaults to the file stem)
        #[arg(short, long)]
        subject: Option<String>,

        /// Content hash of the source audio
        #[arg(long, default_value = "")]
        hash: String,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the merged configuration
    Show {
        /// Show the raw merged document instead of the typed settings
        #[arg(long)]
        raw: bool,
    },

    /// Show the user-level configuration file path
    Path,
}
