//! Default paths for autoshutdownd
//!
//! The daemon runs as a system service, so the configuration lives under
//! `/etc` unless overridden.

use std::path::PathBuf;

/// Environment variable for overriding the configuration file path
pub const AUTO_SHUTDOWN_CONFIG_ENV: &str = "AUTO_SHUTDOWN_CONFIG";

/// System-wide configuration file location
pub const SYSTEM_CONFIG_PATH: &str = "/etc/autoshutdown/config.toml";

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$AUTO_SHUTDOWN_CONFIG` environment variable (if set)
/// 2. `/etc/autoshutdown/config.toml`
pub fn default_config_path() -> PathBuf {
    config_path_from(std::env::var(AUTO_SHUTDOWN_CONFIG_ENV).ok())
}

fn config_path_from(env_value: Option<String>) -> PathBuf {
    match env_value {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(SYSTEM_CONFIG_PATH),
    }
}
