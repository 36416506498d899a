//! Raw configuration schema (as parsed from TOML)

use autoshutdown_host_api::PlatformKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::CURRENT_CONFIG_VERSION;

/// Raw configuration as parsed from TOML
///
/// Every tunable is optional; missing values fall back to built-in
/// defaults when the config is finalized.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Idle detection tunables
    #[serde(default)]
    pub monitor: RawMonitorConfig,

    /// How the host is probed and powered off
    #[serde(default)]
    pub host: RawHostConfig,

    /// Cloud platform handling
    #[serde(default)]
    pub platform: RawPlatformConfig,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION,
            monitor: RawMonitorConfig::default(),
            host: RawHostConfig::default(),
            platform: RawPlatformConfig::default(),
        }
    }
}

/// Idle detection tunables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMonitorConfig {
    /// 5-minute load average at or above which the host counts as active
    pub load_threshold: Option<f64>,

    /// Consecutive idle ticks before shutdown is considered
    pub required_idle_intervals: Option<u32>,

    /// Tick period
    pub interval_seconds: Option<u64>,

    /// Delay between a confirmed shutdown and the power-off
    pub shutdown_grace_seconds: Option<u64>,

    /// Wait before the first tick
    pub initial_delay_seconds: Option<u64>,
}

/// Host probing and power-off settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawHostConfig {
    /// Port whose established connections count as SSH sessions
    pub ssh_port: Option<u16>,

    /// Upper bound for every external command (ss, who, power-off)
    pub command_timeout_seconds: Option<u64>,

    /// argv used to power off the machine
    pub poweroff_command: Option<Vec<String>>,

    /// Load average source (default: /proc/loadavg)
    pub loadavg_path: Option<PathBuf>,
}

/// Cloud platform handling
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPlatformConfig {
    /// Refuse to run unless this platform is detected ("gce" or "azure")
    pub require: Option<PlatformKind>,

    /// Suppress the Azure deallocation notice
    pub silence_azure_warning: Option<bool>,

    /// Timeout for each metadata endpoint probe
    pub metadata_timeout_seconds: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [monitor]
            load_threshold = 0.3
            required_idle_intervals = 10
            interval_seconds = 60
            shutdown_grace_seconds = 120
            initial_delay_seconds = 0

            [host]
            ssh_port = 2222
            command_timeout_seconds = 5
            poweroff_command = ["systemctl", "poweroff"]

            [platform]
            require = "gce"
            silence_azure_warning = true
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitor.load_threshold, Some(0.3));
        assert_eq!(config.monitor.required_idle_intervals, Some(10));
        assert_eq!(config.host.ssh_port, Some(2222));
        assert_eq!(
            config.host.poweroff_command,
            Some(vec!["systemctl".to_string(), "poweroff".to_string()])
        );
        assert_eq!(config.platform.require, Some(PlatformKind::Gce));
        assert_eq!(config.platform.silence_azure_warning, Some(true));
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.monitor.load_threshold.is_none());
        assert!(config.host.poweroff_command.is_none());
        assert!(config.platform.require.is_none());
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let toml_str = r#"
            config_version = 1

            [platform]
            require = "aws"
        "#;

        assert!(toml::from_str::<RawConfig>(toml_str).is_err());
    }
}
