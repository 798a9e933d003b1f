//! Init command - create a context directory in place.

use crate::cli::Output;
use crate::config::DiscoverySettings;
use crate::context::EntityType;
use crate::storage::Storage;
use anyhow::Result;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# Protokoll configuration for this directory.
# Values here override those of parent directories.

routing:
  default:
    path: ~/notes
    structure: month
    filename_options: [date, time, subject]
  min_confidence: 0.5
"#;

/// Run the init command.
pub async fn run_init(
    storage: &dyn Storage,
    dir: &Path,
    discovery: &DiscoverySettings,
    force: bool,
) -> Result<()> {
    let marker = dir.join(&discovery.marker);
    let config_path = marker.join(&discovery.config_file);
    let context_dir = marker.join(&discovery.context_dir);

    Output::header("Protokoll Setup");

    if storage.is_file(&config_path).await && !force {
        Output::warning(&format!(
            "{} already exists; use --force to overwrite it.",
            config_path.display()
        ));
    } else {
        storage.write(&config_path, CONFIG_TEMPLATE).await?;
        Output::success(&format!("Wrote {}", config_path.display()));
    }

    for entity_type in EntityType::ALL {
        let type_dir = context_dir.join(entity_type.dir_name());
        if !storage.is_dir(&type_dir).await {
            storage.create_dir_all(&type_dir).await?;
            Output::list_item(&format!("Created {}", type_dir.display()));
        }
    }

    println!();
    Output::info("Add entities with 'protokoll add <type> <name>'.");
    Ok(())
}
