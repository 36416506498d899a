//! Configuration parsing and validation for autoshutdownd
//!
//! Settings are resolved in layers, later layers winning:
//! - Built-in defaults
//! - Versioned TOML file
//! - Environment variables (`SHUTDOWN_THRESHOLD`, `SHUTDOWN_INTERVALS`, ...)
//! - Command-line flags (applied by the daemon on the raw config)
//!
//! Validation runs once on the merged result.

mod env;
mod schema;
mod settings;
mod validation;

pub use env::*;
pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.errors))]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    finalize(parse_raw(content)?)
}

/// Parse a TOML string without validating values
pub fn parse_raw(content: &str) -> ConfigResult<RawConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    Ok(raw)
}

/// Read the raw config file.
///
/// When `required` is false a missing file yields the built-in defaults,
/// so the daemon runs out of the box without `/etc/autoshutdown`.
pub fn load_raw(path: impl AsRef<Path>, required: bool) -> ConfigResult<RawConfig> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(content) => parse_raw(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(RawConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Validate a merged raw config and convert it to settings
pub fn finalize(raw: RawConfig) -> ConfigResult<Settings> {
    finalize_with_errors(raw, Vec::new())
}

/// Like [`finalize`], but reports `earlier` errors (e.g. from environment
/// overrides) together with the validation errors of the merged config
pub fn finalize_with_errors(
    raw: RawConfig,
    mut earlier: Vec<ValidationError>,
) -> ConfigResult<Settings> {
    earlier.extend(validate_config(&raw));
    if !earlier.is_empty() {
        return Err(ConfigError::ValidationFailed { errors: earlier });
    }

    Ok(Settings::from_raw(raw))
}
