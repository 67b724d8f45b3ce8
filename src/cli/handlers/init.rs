use crate::config::{CONFIG_FILE_NAME, TypegraphConfig};
use crate::error::TypegraphError;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tracing::info;

pub fn handle_init(cwd: &Path, force: bool) -> Result<()> {
    let config_path = cwd.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        return Err(TypegraphError::AlreadyInitialized(config_path.display().to_string()).into());
    }

    TypegraphConfig::default().save(&config_path)?;
    info!(path = %config_path.display(), "wrote config");

    println!(
        "{} typegraph project in {}",
        "Initialized".green(),
        cwd.display()
    );
    println!("  Config: {}", config_path.display());

    Ok(())
}
