//! Shutdown executor
//!
//! Runs once the engine reports a shutdown candidate: re-checks that
//! nobody is using the machine, announces the shutdown, waits out the
//! grace window, then issues a single power-off.

use autoshutdown_config::MonitorConfig;
use autoshutdown_host_api::{SampleSource, ShutdownAction, Sleeper};
use autoshutdown_util::format_duration_long;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Why a shutdown candidate was not acted on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    UsersLoggedIn(u32),
    SshSessions(u32),
    /// A probe failed, so idleness could not be confirmed
    RecheckFailed(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::UsersLoggedIn(n) => write!(f, "{} user(s) logged in", n),
            AbortReason::SshSessions(n) => write!(f, "{} SSH session(s) active", n),
            AbortReason::RecheckFailed(e) => write!(f, "re-check failed: {}", e),
        }
    }
}

/// Result of one shutdown attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The re-check found activity; monitoring resumes
    Aborted { reason: AbortReason },

    /// Power-off was issued. `power_off_error` is set when the command
    /// reported a failure; it is not retried.
    Executed { power_off_error: Option<String> },
}

impl ExecutionResult {
    pub fn is_executed(&self) -> bool {
        matches!(self, ExecutionResult::Executed { .. })
    }
}

/// Performs the final confirmation and the power-off
pub struct ShutdownExecutor {
    source: Arc<dyn SampleSource>,
    action: Arc<dyn ShutdownAction>,
    sleeper: Arc<dyn Sleeper>,
}

impl ShutdownExecutor {
    pub fn new(
        source: Arc<dyn SampleSource>,
        action: Arc<dyn ShutdownAction>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            source,
            action,
            sleeper,
        }
    }

    /// Human-readable description of the power-off action
    pub fn action_description(&self) -> String {
        self.action.describe()
    }

    /// Confirm that no user is logged in and no SSH session is open.
    ///
    /// Fresh values are queried; the tick's sample is not reused.
    pub async fn recheck(&self) -> Result<(), AbortReason> {
        let users = self
            .source
            .count_logged_in_users()
            .await
            .map_err(|e| AbortReason::RecheckFailed(format!("logged-in users: {}", e)))?;
        if users > 0 {
            return Err(AbortReason::UsersLoggedIn(users));
        }

        let sessions = self
            .source
            .count_ssh_sessions()
            .await
            .map_err(|e| AbortReason::RecheckFailed(format!("ssh sessions: {}", e)))?;
        if sessions > 0 {
            return Err(AbortReason::SshSessions(sessions));
        }

        Ok(())
    }

    /// Attempt a shutdown. Issues at most one power-off.
    pub async fn attempt_shutdown(&self, config: &MonitorConfig) -> ExecutionResult {
        if let Err(reason) = self.recheck().await {
            match &reason {
                AbortReason::RecheckFailed(_) => {
                    warn!(reason = %reason, "Shutdown aborted, resuming monitoring")
                }
                _ => info!(reason = %reason, "Shutdown aborted, resuming monitoring"),
            }
            return ExecutionResult::Aborted { reason };
        }

        warn!(
            "Shutting down in {}",
            format_duration_long(config.shutdown_grace)
        );
        self.sleeper.sleep(config.shutdown_grace).await;

        info!(action = %self.action.describe(), "Powering off");
        match self.action.power_off().await {
            Ok(()) => ExecutionResult::Executed {
                power_off_error: None,
            },
            Err(e) => {
                error!(error = %e, "Power-off failed");
                ExecutionResult::Executed {
                    power_off_error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoshutdown_host_api::MockHost;
    use std::time::Duration;

    fn make_config() -> MonitorConfig {
        MonitorConfig {
            load_threshold: 0.15,
            required_idle_intervals: 1,
            interval: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(300),
            initial_delay: Duration::ZERO,
        }
    }

    fn executor_for(host: &Arc<MockHost>) -> ShutdownExecutor {
        ShutdownExecutor::new(host.clone(), host.clone(), host.clone())
    }

    #[tokio::test]
    async fn idle_host_is_powered_off_after_grace() {
        let host = Arc::new(MockHost::new());
        let executor = executor_for(&host);

        let result = executor.attempt_shutdown(&make_config()).await;

        assert_eq!(
            result,
            ExecutionResult::Executed {
                power_off_error: None
            }
        );
        assert_eq!(host.power_off_calls(), 1);
        assert_eq!(host.sleeps(), vec![Duration::from_secs(300)]);
    }

    #[tokio::test]
    async fn logged_in_user_aborts() {
        let host = Arc::new(MockHost::new());
        host.push_logged_in_users(1);
        let executor = executor_for(&host);

        let result = executor.attempt_shutdown(&make_config()).await;

        assert_eq!(
            result,
            ExecutionResult::Aborted {
                reason: AbortReason::UsersLoggedIn(1)
            }
        );
        assert_eq!(host.power_off_calls(), 0);
        assert!(host.sleeps().is_empty());
    }

    #[tokio::test]
    async fn ssh_session_aborts() {
        let host = Arc::new(MockHost::new());
        host.push_ssh_sessions(2);
        let executor = executor_for(&host);

        let result = executor.attempt_shutdown(&make_config()).await;

        assert_eq!(
            result,
            ExecutionResult::Aborted {
                reason: AbortReason::SshSessions(2)
            }
        );
        assert_eq!(host.power_off_calls(), 0);
    }

    #[tokio::test]
    async fn failed_recheck_aborts() {
        let host = Arc::new(MockHost::new());
        host.fail_next_logged_in_users("who: not found");
        let executor = executor_for(&host);

        let result = executor.attempt_shutdown(&make_config()).await;

        assert!(matches!(
            result,
            ExecutionResult::Aborted {
                reason: AbortReason::RecheckFailed(_)
            }
        ));
        assert_eq!(host.power_off_calls(), 0);
    }

    #[tokio::test]
    async fn power_off_failure_is_reported_not_retried() {
        let host = Arc::new(MockHost::new());
        *host.fail_power_off.lock().unwrap() = true;
        let executor = executor_for(&host);

        let result = executor.attempt_shutdown(&make_config()).await;

        match result {
            ExecutionResult::Executed {
                power_off_error: Some(message),
            } => assert!(message.contains("Mock power-off failure")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(host.power_off_calls(), 1);
    }

    #[test]
    fn abort_reason_messages() {
        assert_eq!(
            AbortReason::UsersLoggedIn(2).to_string(),
            "2 user(s) logged in"
        );
        assert_eq!(
            AbortReason::SshSessions(1).to_string(),
            "1 SSH session(s) active"
        );
    }
}
