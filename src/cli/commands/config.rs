//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use crate::context::ContextInstance;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, ctx: &ContextInstance) -> Result<()> {
    match action {
        ConfigAction::Show { raw: false } => {
            print!("{}", ctx.settings().to_yaml()?);
        }

        ConfigAction::Show { raw: true } => {
            print!("{}", serde_yaml::to_string(ctx.raw_config())?);
        }

        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }
    }

    Ok(())
}
