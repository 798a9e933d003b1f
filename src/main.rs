//! Protokoll CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use protokoll::cli::{commands, Cli, Commands, Output};
use protokoll::config::Settings;
use protokoll::context::ContextInstance;
use protokoll::storage::{LocalStorage, Storage};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load the user-level configuration before logging so its level applies
    let base = Settings::load_base(cli.config.as_deref())?;
    let base_settings = Settings::from_value(base.clone())?;

    let log_level = match cli.verbose {
        0 => base_settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("protokoll={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let start_dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };
    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new());

    if let Commands::Init { force } = &cli.command {
        return commands::run_init(storage.as_ref(), &start_dir, &base_settings.discovery, *force).await;
    }

    let spinner = Output::spinner("Loading context...");
    let built = ContextInstance::build(storage, &start_dir, base).await;
    spinner.finish_and_clear();
    let mut ctx = built?;

    match cli.command {
        Commands::Init { .. } => {}

        Commands::Context => {
            commands::run_context(&ctx)?;
        }

        Commands::List { entity_type, all } => {
            commands::run_list(&ctx, entity_type, all)?;
        }

        Commands::Show { entity_type, query } => {
            commands::run_show(&ctx, entity_type, &query)?;
        }

        Commands::Search { query } => {
            commands::run_search(&ctx, &query)?;
        }

        Commands::Add {
            entity_type,
            name,
            id,
            sounds_like,
            phrases,
            topics,
            destination,
        } => {
            let args = commands::AddArgs {
                entity_type,
                name,
                id,
                sounds_like,
                phrases,
                topics,
                destination,
            };
            commands::run_add(&mut ctx, args).await?;
        }

        Commands::Edit {
            entity_type,
            id,
            name,
            add_sounds_like,
            remove_sounds_like,
            activate,
            deactivate,
        } => {
            let active = match (activate, deactivate) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let args = commands::EditArgs {
                name,
                add_sounds_like,
                remove_sounds_like,
                active,
            };
            commands::run_edit(&mut ctx, entity_type, &id, args).await?;
        }

        Commands::Remove { entity_type, id } => {
            commands::run_remove(&mut ctx, entity_type, &id).await?;
        }

        Commands::Route {
            file,
            date,
            subject,
            hash,
            json,
        } => {
            let args = commands::RouteArgs {
                file,
                date,
                subject,
                hash,
                json,
            };
            commands::run_route(&ctx, args).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, &ctx)?;
        }
    }

    Ok(())
}
