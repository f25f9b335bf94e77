//! Configuration loading from TOML files

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::types::Config;

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from a file on disk
    File(PathBuf),
    /// No file present; built-in defaults
    Defaults,
}

impl ConfigSource {
    /// Human-readable description for startup logging
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::File(path) => format!("file '{}'", path.display()),
            Self::Defaults => "built-in defaults".to_string(),
        }
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(config_path: impl AsRef<Path>) -> Result<Config> {
    let path = config_path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from `config_path` if it exists, otherwise use defaults
///
/// A file that exists but does not parse is an error, not a fallback.
pub fn load_config_with_fallback(config_path: impl AsRef<Path>) -> Result<(Config, ConfigSource)> {
    let path = config_path.as_ref();
    if path.exists() {
        let config = load_config(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    tracing::debug!(
        path = %path.display(),
        "Config file not found, using defaults"
    );
    Ok((Config::default(), ConfigSource::Defaults))
}
