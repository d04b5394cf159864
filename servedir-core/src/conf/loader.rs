use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::conf::error::ConfigError;
use crate::conf::types::AppConfig;

/// Reads, parses and validates a TOML configuration file.
///
/// A relative `public` directory is taken relative to the file's parent
/// directory.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let mut config: AppConfig = toml::from_str(&raw).map_err(|e| ConfigError::parse(path, e))?;

    if config.serve.public.is_relative()
        && let Some(parent) = path.parent()
    {
        config.serve.public = parent.join(&config.serve.public);
    }

    config.serve.validate()?;
    Ok(config)
}

impl FromStr for AppConfig {
    type Err = ConfigError;

    /// Parses an in-memory document. `public` is validated as-is, relative to
    /// the working directory.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config: AppConfig =
            toml::from_str(s).map_err(|e| ConfigError::parse("<inline>", e))?;
        config.serve.validate()?;
        Ok(config)
    }
}
