// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawSchedulerConfig, SchedulerConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawSchedulerConfig`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to also
/// parse durations and log levels.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSchedulerConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    from_toml_str(&contents)
}

/// Deserialize a raw configuration from TOML text.
pub fn from_toml_str(contents: &str) -> Result<RawSchedulerConfig> {
    let config: RawSchedulerConfig = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for embedding programs that keep
/// retry/timeout tuning outside their code.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SchedulerConfig> {
    let raw_config = load_from_path(&path)?;
    SchedulerConfig::try_from(raw_config)
}
