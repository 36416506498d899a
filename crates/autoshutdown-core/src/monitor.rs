//! The monitor loop
//!
//! Samples the host once per interval, feeds the reading to the decision
//! engine and, on a shutdown candidate, hands over to the executor.

use autoshutdown_config::MonitorConfig;
use autoshutdown_host_api::{SampleSource, ShutdownAction, Sleeper};
use autoshutdown_util::format_duration_long;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    Decision, ExecutionResult, MonitorState, ShutdownExecutor, StatusLine, activity_of,
    banner_lines, decide,
};

/// What happened during one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// 1-based tick number
    pub tick: u64,

    /// Idle streak as decided for this tick, before any post-shutdown reset
    pub idle_streak: u32,

    pub decision: Decision,

    /// Set only when the tick produced a shutdown candidate
    pub execution: Option<ExecutionResult>,
}

/// Drives sampling, decisions, and shutdown attempts
pub struct MonitorLoop {
    config: MonitorConfig,
    source: Arc<dyn SampleSource>,
    sleeper: Arc<dyn Sleeper>,
    executor: ShutdownExecutor,
    state: MonitorState,
    tick: u64,
}

impl MonitorLoop {
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn SampleSource>,
        action: Arc<dyn ShutdownAction>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let executor = ShutdownExecutor::new(source.clone(), action, sleeper.clone());

        Self {
            config,
            source,
            sleeper,
            executor,
            state: MonitorState::new(),
            tick: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Wait out the initial delay, then log the startup banner
    pub async fn start(&self) {
        if !self.config.initial_delay.is_zero() {
            info!(
                "Waiting for {} before starting...",
                format_duration_long(self.config.initial_delay)
            );
            self.sleeper.sleep(self.config.initial_delay).await;
        }

        for line in banner_lines(&self.config, &self.executor.action_description()) {
            info!("{}", line);
        }
    }

    /// Run a single tick: sample, decide, and attempt a shutdown if due
    pub async fn tick(&mut self) -> TickReport {
        self.tick += 1;

        let reading = self.source.take().await;
        let previous = self.state;
        let (state, decision) = decide(previous, &reading, &self.config);
        self.state = state;

        info!(
            "{}",
            StatusLine {
                tick: self.tick,
                state,
                reading: &reading,
                config: &self.config,
            }
        );

        if decision == Decision::Reset
            && previous.idle_streak > 0
            && let Some(cause) = activity_of(&reading, &self.config)
        {
            debug!(
                cause = cause.as_str(),
                previous_streak = previous.idle_streak,
                "Idle streak reset"
            );
        }

        let execution = if decision == Decision::ShutdownCandidate {
            info!(
                idle_streak = state.idle_streak,
                "Machine idle for {}, attempting shutdown",
                format_duration_long(self.config.min_idle_before_shutdown())
            );
            let result = self.executor.attempt_shutdown(&self.config).await;

            // Either the re-check found activity, or power-off returned
            // without the OS terminating us (dry run, failed command).
            self.state.reset();
            if result.is_executed() {
                info!("Still running after power-off, resuming monitoring");
            }
            Some(result)
        } else {
            None
        };

        TickReport {
            tick: self.tick,
            idle_streak: state.idle_streak,
            decision,
            execution,
        }
    }

    /// Start, then tick once per interval. Never returns; the caller
    /// stops it by dropping the future.
    pub async fn run(mut self) {
        self.start().await;

        loop {
            self.tick().await;
            self.sleeper.sleep(self.config.interval).await;
        }
    }
}
