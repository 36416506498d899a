//! Environment variable overrides
//!
//! Environment values take precedence over the config file. Empty values
//! are treated as unset; anything else must parse.

use std::str::FromStr;

use crate::schema::RawConfig;
use crate::validation::ValidationError;

pub const ENV_THRESHOLD: &str = "SHUTDOWN_THRESHOLD";
pub const ENV_INTERVALS: &str = "SHUTDOWN_INTERVALS";
pub const ENV_SLEEP_TIME: &str = "SHUTDOWN_SLEEP_TIME";
pub const ENV_GRACE_TIME: &str = "SHUTDOWN_GRACE_TIME";
pub const ENV_INITIAL_DELAY: &str = "INITIAL_DELAY";
pub const ENV_SILENCE_AZURE_WARNING: &str = "AUTO_SHUTDOWN_SILENCE_AZURE_WARNING";

/// Apply overrides from the process environment
pub fn apply_process_env(config: &mut RawConfig) -> Vec<ValidationError> {
    apply_env_overrides(config, |var| std::env::var(var).ok())
}

/// Apply overrides using `lookup` to read variables.
///
/// Returns one error per variable that is set but does not parse; the
/// corresponding config value is left untouched.
pub fn apply_env_overrides<F>(config: &mut RawConfig, lookup: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(v) = read_var(&lookup, ENV_THRESHOLD, &mut errors, parse_number) {
        config.monitor.load_threshold = Some(v);
    }
    if let Some(v) = read_var(&lookup, ENV_INTERVALS, &mut errors, parse_number) {
        config.monitor.required_idle_intervals = Some(v);
    }
    if let Some(v) = read_var(&lookup, ENV_SLEEP_TIME, &mut errors, parse_number) {
        config.monitor.interval_seconds = Some(v);
    }
    if let Some(v) = read_var(&lookup, ENV_GRACE_TIME, &mut errors, parse_number) {
        config.monitor.shutdown_grace_seconds = Some(v);
    }
    if let Some(v) = read_var(&lookup, ENV_INITIAL_DELAY, &mut errors, parse_number) {
        config.monitor.initial_delay_seconds = Some(v);
    }
    if let Some(v) = read_var(&lookup, ENV_SILENCE_AZURE_WARNING, &mut errors, parse_bool) {
        config.platform.silence_azure_warning = Some(v);
    }

    errors
}

fn read_var<T, F, P>(
    lookup: &F,
    var: &str,
    errors: &mut Vec<ValidationError>,
    parse: P,
) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T, String>,
{
    let raw = lookup(var)?;
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    match parse(value) {
        Ok(parsed) => {
            tracing::debug!(var, value, "Applied environment override");
            Some(parsed)
        }
        Err(message) => {
            errors.push(ValidationError::InvalidEnvValue {
                var: var.to_string(),
                value: raw.clone(),
                message,
            });
            None
        }
    }
}

fn parse_number<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| e.to_string())
}

/// Accepts the usual spellings: 1/0, t/f, true/false, yes/no, on/off
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{}'", other)),
    }
}
