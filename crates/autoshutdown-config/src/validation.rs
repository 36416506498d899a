//! Configuration validation

use crate::schema::RawConfig;
use autoshutdown_host_api::PlatformKind;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment variable {var}='{value}': {message}")]
    InvalidEnvValue {
        var: String,
        value: String,
        message: String,
    },
}

impl ValidationError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a raw configuration (after environment overrides)
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let monitor = &config.monitor;
    if let Some(threshold) = monitor.load_threshold
        && !(threshold.is_finite() && threshold >= 0.0)
    {
        errors.push(ValidationError::invalid(
            "monitor.load_threshold",
            format!("must be a finite number >= 0, got {}", threshold),
        ));
    }
    if monitor.required_idle_intervals == Some(0) {
        errors.push(ValidationError::invalid(
            "monitor.required_idle_intervals",
            "must be at least 1",
        ));
    }
    if monitor.interval_seconds == Some(0) {
        errors.push(ValidationError::invalid(
            "monitor.interval_seconds",
            "must be at least 1",
        ));
    }

    let host = &config.host;
    if host.ssh_port == Some(0) {
        errors.push(ValidationError::invalid("host.ssh_port", "must not be 0"));
    }
    if host.command_timeout_seconds == Some(0) {
        errors.push(ValidationError::invalid(
            "host.command_timeout_seconds",
            "must be at least 1",
        ));
    }
    if let Some(argv) = &host.poweroff_command
        && argv.first().is_none_or(|program| program.trim().is_empty())
    {
        errors.push(ValidationError::invalid(
            "host.poweroff_command",
            "must name a program",
        ));
    }

    let platform = &config.platform;
    if platform.require == Some(PlatformKind::Generic) {
        errors.push(ValidationError::invalid(
            "platform.require",
            "must be \"gce\" or \"azure\"",
        ));
    }
    if platform.metadata_timeout_seconds == Some(0) {
        errors.push(ValidationError::invalid(
            "platform.metadata_timeout_seconds",
            "must be at least 1",
        ));
    }

    errors
}
