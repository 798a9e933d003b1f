//! Protokoll - context resolution and transcript routing
//!
//! Protokoll augments machine transcription with organization-specific
//! knowledge. It finds the people, projects, companies and terms a transcript
//! mentions, even when the transcription mangles them, and decides which
//! destination folder the transcript belongs to.
//!
//! # Architecture
//!
//! - `storage` - Filesystem abstraction
//! - `config` - Settings schema and hierarchical configuration merging
//! - `context` - Directory discovery, entity store and resilient lookup
//! - `routing` - Signal-based, confidence-scored routing decisions
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use protokoll::config::Settings;
//! use protokoll::context::ContextInstance;
//! use protokoll::routing::{RoutingContext, RoutingInstance};
//! use protokoll::storage::LocalStorage;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let base = Settings::load_base(None)?;
//!     let cwd = std::env::current_dir()?;
//!     let ctx = ContextInstance::build(Arc::new(LocalStorage::new()), &cwd, base).await?;
//!
//!     let jane = ctx.find_person("jane smiht")?;
//!     println!("Resolved {}", jane.name);
//!
//!     let router = RoutingInstance::new(&ctx.settings().routing, &ctx);
//!     let decision = router.route(&RoutingContext {
//!         transcript_text: "Walmart meeting notes".to_string(),
//!         audio_date: chrono::Local::now().naive_local(),
//!         source_file: "meeting.m4a".into(),
//!         hash: String::new(),
//!     });
//!     println!("{:?} ({:.2})", decision.project_id, decision.confidence);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod routing;
pub mod storage;

pub use error::{ProtokollError, Result};
