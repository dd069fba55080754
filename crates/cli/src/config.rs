//! CLI configuration utilities

use anyhow::{Context, Result};
use igen_core::ClientConfig;
use std::path::Path;

/// Default config file written by `igen config init`
pub const DEFAULT_CONFIG_FILE: &str = "igen.toml";

/// Load client configuration, from `path` when given
pub fn load(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ClientConfig::load().context("Failed to load configuration"),
    }
}

/// Render configuration as TOML
pub fn render(config: &ClientConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

/// Write a default configuration file
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let content = render(&ClientConfig::default())?;
    std::fs::write(path, content)?;
    Ok(())
}
