//! Validated settings structures

use crate::schema::{RawConfig, RawHostConfig, RawMonitorConfig, RawPlatformConfig};
use autoshutdown_host_api::PlatformKind;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOAD_THRESHOLD: f64 = 0.15;
pub const DEFAULT_REQUIRED_IDLE_INTERVALS: u32 = 15;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 30;
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 300;
pub const DEFAULT_INITIAL_DELAY_SECONDS: u64 = 3600;
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_METADATA_TIMEOUT_SECONDS: u64 = 2;
pub const DEFAULT_LOADAVG_PATH: &str = "/proc/loadavg";

fn default_poweroff_command() -> Vec<String> {
    vec!["sudo".to_string(), "poweroff".to_string()]
}

/// Validated settings, fixed for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub monitor: MonitorConfig,
    pub host: HostConfig,
    pub platform: PlatformConfig,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            monitor: MonitorConfig::from_raw(raw.monitor),
            host: HostConfig::from_raw(raw.host),
            platform: PlatformConfig::from_raw(raw.platform),
        }
    }
}

/// Tunables of the idle monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Load at or above this counts as activity
    pub load_threshold: f64,

    /// Consecutive idle ticks before a shutdown is considered (>= 1)
    pub required_idle_intervals: u32,

    /// Tick period (>= 1s)
    pub interval: Duration,

    /// Delay between a confirmed shutdown and the power-off
    pub shutdown_grace: Duration,

    /// Wait before monitoring starts
    pub initial_delay: Duration,
}

impl MonitorConfig {
    fn from_raw(raw: RawMonitorConfig) -> Self {
        Self {
            load_threshold: raw.load_threshold.unwrap_or(DEFAULT_LOAD_THRESHOLD),
            required_idle_intervals: raw
                .required_idle_intervals
                .unwrap_or(DEFAULT_REQUIRED_IDLE_INTERVALS),
            interval: Duration::from_secs(
                raw.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS),
            ),
            shutdown_grace: Duration::from_secs(
                raw.shutdown_grace_seconds
                    .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECONDS),
            ),
            initial_delay: Duration::from_secs(
                raw.initial_delay_seconds
                    .unwrap_or(DEFAULT_INITIAL_DELAY_SECONDS),
            ),
        }
    }

    /// Shortest idle time that can lead to a shutdown
    pub fn min_idle_before_shutdown(&self) -> Duration {
        self.interval.saturating_mul(self.required_idle_intervals)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_raw(RawMonitorConfig::default())
    }
}

/// How the host is probed and powered off
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub ssh_port: u16,
    pub command_timeout: Duration,
    pub poweroff_command: Vec<String>,
    pub loadavg_path: PathBuf,
}

impl HostConfig {
    fn from_raw(raw: RawHostConfig) -> Self {
        Self {
            ssh_port: raw.ssh_port.unwrap_or(DEFAULT_SSH_PORT),
            command_timeout: Duration::from_secs(
                raw.command_timeout_seconds
                    .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECONDS),
            ),
            poweroff_command: raw
                .poweroff_command
                .unwrap_or_else(default_poweroff_command),
            loadavg_path: raw
                .loadavg_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOADAVG_PATH)),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::from_raw(RawHostConfig::default())
    }
}

/// Cloud platform handling
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    /// Abort unless running on this platform
    pub require: Option<PlatformKind>,
    pub silence_azure_warning: bool,
    pub metadata_timeout: Duration,
}

impl PlatformConfig {
    fn from_raw(raw: RawPlatformConfig) -> Self {
        Self {
            require: raw.require,
            silence_azure_warning: raw.silence_azure_warning.unwrap_or(false),
            metadata_timeout: Duration::from_secs(
                raw.metadata_timeout_seconds
                    .unwrap_or(DEFAULT_METADATA_TIMEOUT_SECONDS),
            ),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::from_raw(RawPlatformConfig::default())
    }
}
