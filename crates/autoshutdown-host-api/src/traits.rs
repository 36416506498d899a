//! Host adapter traits

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::{PlatformKind, Reading, Sample};

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("Command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Command `{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HostError {
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Source of per-tick system metrics
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Current 5-minute load average
    async fn read_load(&self) -> HostResult<f64>;

    /// Established inbound connections on the SSH port
    async fn count_ssh_sessions(&self) -> HostResult<u32>;

    /// Active login sessions (console + remote)
    async fn count_logged_in_users(&self) -> HostResult<u32>;

    /// Take one tick's reading.
    ///
    /// Load and SSH sessions drive the idle decision, so failing to read
    /// either makes the whole reading unavailable. The logged-in count is
    /// only displayed at tick time and degrades to `None`.
    async fn take(&self) -> Reading {
        let load = match self.read_load().await {
            Ok(load) => load,
            Err(e) => {
                warn!(error = %e, "Failed to read load average");
                return Reading::unavailable(format!("load average: {}", e));
            }
        };

        let ssh_sessions = match self.count_ssh_sessions().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count SSH sessions");
                return Reading::unavailable(format!("ssh sessions: {}", e));
            }
        };

        let logged_in_users = match self.count_logged_in_users().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "Failed to count logged-in users");
                None
            }
        };

        Reading::Sample(Sample::new(load, ssh_sessions, logged_in_users))
    }
}

/// Irreversible power-off of the host
#[async_trait]
pub trait ShutdownAction: Send + Sync {
    /// Issue the power-off. Best effort; callers do not retry.
    async fn power_off(&self) -> HostResult<()>;

    /// Human-readable description of what `power_off` does
    fn describe(&self) -> String;
}

/// Detects the cloud platform the host runs on
#[async_trait]
pub trait PlatformDetector: Send + Sync {
    /// Never fails: unreachable metadata endpoints mean "not that platform"
    async fn detect(&self) -> PlatformKind;
}

/// Suspension point used for the tick interval and the shutdown grace window.
///
/// Kept behind a trait so tests run without wall-clock waits and so a
/// cancellable grace window can be swapped in without touching the core.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
