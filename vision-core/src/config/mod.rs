//! Configuration module
//!
//! Loads the provider, resilience, connection and upload settings from YAML
//! or JSON, interpolating `${VAR}` references from the environment before
//! parsing.

mod env;
mod error;
mod schema;
mod secrets;

pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ConnectionConfig, ProviderConfig, ResilienceConfig, UploadPolicy, VisionConfig, CONFIG_VERSION,
};
pub use secrets::SecretString;

use std::fs;
use std::path::Path;

fn read_interpolated(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    env::interpolate_env_vars(&content)
}

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<VisionConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;
    parse_yaml(&interpolated, &path.to_string_lossy())
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<VisionConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: VisionConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

/// Parse and validate an already-interpolated YAML document
pub fn parse_yaml(content: &str, origin: &str) -> ConfigResult<VisionConfig> {
    let config: VisionConfig =
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}
