//! Config file loading and validation.

use std::fs;
use std::path::Path;

use log::info;

use crate::error::ConfigError;
use crate::model::ConvomapConfig;

/// Load config from a json5 file and validate it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConvomapConfig, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let config = load_from_str(&raw)?;
    info!("loaded config (path={})", path.display());
    Ok(config)
}

/// Parse config from a json5 string and validate it.
pub fn load_from_str(raw: &str) -> Result<ConvomapConfig, ConfigError> {
    let config: ConvomapConfig = json5::from_str(raw)?;
    validate(&config)?;
    Ok(config)
}

/// Validate field-level constraints.
pub fn validate(config: &ConvomapConfig) -> Result<(), ConfigError> {
    if config.map_name_prefix.is_empty() {
        return Err(invalid("map_name_prefix", "must not be empty"));
    }
    if config.min_bootstrap_rows == 0 {
        return Err(invalid("min_bootstrap_rows", "must be at least 1"));
    }
    if config.recent_message_window == 0 {
        return Err(invalid("recent_message_window", "must be at least 1"));
    }
    if config.retry.max_attempts == 0 {
        return Err(invalid("retry.max_attempts", "must be at least 1"));
    }
    if config.retry.growth_factor <= 1.0 {
        return Err(invalid(
            "retry.growth_factor",
            "must exceed 1.0 so backoff delays strictly increase",
        ));
    }
    Ok(())
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}
