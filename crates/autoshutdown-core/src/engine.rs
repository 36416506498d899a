//! Idle decision engine
//!
//! A pure function of (state, reading, config). A machine must look idle
//! for `required_idle_intervals` consecutive ticks before it becomes a
//! shutdown candidate, and any sign of activity starts the count over.

use autoshutdown_config::MonitorConfig;
use autoshutdown_host_api::Reading;

/// State carried from one tick to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorState {
    /// Consecutive idle ticks observed so far
    pub idle_streak: u32,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.idle_streak = 0;
    }
}

/// Outcome of evaluating one reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Idle, but the streak is still short of the requirement
    Continue,

    /// Activity observed; the streak starts over
    Reset,

    /// Idle for long enough; hand over to the shutdown executor
    ShutdownCandidate,
}

/// Why a tick counted as active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityCause {
    Load,
    SshSessions,
    SampleUnavailable,
}

impl ActivityCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCause::Load => "load",
            ActivityCause::SshSessions => "ssh_sessions",
            ActivityCause::SampleUnavailable => "sample_unavailable",
        }
    }
}

/// Classify a reading. `None` means the tick was idle.
///
/// Logged-in users are deliberately not part of this test; they only
/// gate the final re-check before power-off.
pub fn activity_of(reading: &Reading, config: &MonitorConfig) -> Option<ActivityCause> {
    let sample = match reading {
        Reading::Sample(sample) => sample,
        Reading::Unavailable { .. } => return Some(ActivityCause::SampleUnavailable),
    };

    if sample.load >= config.load_threshold {
        Some(ActivityCause::Load)
    } else if sample.ssh_sessions > 0 {
        Some(ActivityCause::SshSessions)
    } else {
        None
    }
}

/// Advance the idle streak by one reading
pub fn decide(
    state: MonitorState,
    reading: &Reading,
    config: &MonitorConfig,
) -> (MonitorState, Decision) {
    if activity_of(reading, config).is_some() {
        return (MonitorState { idle_streak: 0 }, Decision::Reset);
    }

    let next = MonitorState {
        idle_streak: state.idle_streak.saturating_add(1),
    };

    let decision = if next.idle_streak >= config.required_idle_intervals {
        Decision::ShutdownCandidate
    } else {
        Decision::Continue
    };

    (next, decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoshutdown_host_api::Sample;
    use std::time::Duration;

    fn make_config(threshold: f64, required: u32) -> MonitorConfig {
        MonitorConfig {
            load_threshold: threshold,
            required_idle_intervals: required,
            interval: Duration::from_secs(1),
            shutdown_grace: Duration::ZERO,
            initial_delay: Duration::ZERO,
        }
    }

    fn reading(load: f64, ssh_sessions: u32) -> Reading {
        Sample::new(load, ssh_sessions, Some(0)).into()
    }

    fn run(config: &MonitorConfig, readings: &[Reading]) -> Vec<(u32, Decision)> {
        let mut state = MonitorState::new();
        readings
            .iter()
            .map(|r| {
                let (next, decision) = decide(state, r, config);
                state = next;
                (next.idle_streak, decision)
            })
            .collect()
    }

    #[test]
    fn idle_ticks_accumulate_to_candidate() {
        let config = make_config(0.15, 3);
        let readings = vec![reading(0.05, 0); 3];

        assert_eq!(
            run(&config, &readings),
            vec![
                (1, Decision::Continue),
                (2, Decision::Continue),
                (3, Decision::ShutdownCandidate),
            ]
        );
    }

    #[test]
    fn high_load_resets_streak() {
        let config = make_config(0.15, 3);
        let readings = vec![
            reading(0.05, 0),
            reading(0.05, 0),
            reading(0.90, 0),
            reading(0.05, 0),
            reading(0.05, 0),
            reading(0.05, 0),
        ];

        let streaks: Vec<u32> = run(&config, &readings).into_iter().map(|(s, _)| s).collect();
        assert_eq!(streaks, vec![1, 2, 0, 1, 2, 3]);
    }

    #[test]
    fn ssh_session_resets_streak() {
        let config = make_config(0.15, 3);
        let state = MonitorState { idle_streak: 2 };

        let (next, decision) = decide(state, &reading(0.0, 1), &config);
        assert_eq!(next.idle_streak, 0);
        assert_eq!(decision, Decision::Reset);
    }

    #[test]
    fn load_equal_to_threshold_is_active() {
        let config = make_config(0.15, 3);
        assert_eq!(
            activity_of(&reading(0.15, 0), &config),
            Some(ActivityCause::Load)
        );
        assert_eq!(activity_of(&reading(0.1499, 0), &config), None);
    }

    #[test]
    fn unavailable_reading_is_activity() {
        let config = make_config(0.15, 1);
        let state = MonitorState { idle_streak: 5 };

        let (next, decision) = decide(state, &Reading::unavailable("no /proc"), &config);
        assert_eq!(next.idle_streak, 0);
        assert_eq!(decision, Decision::Reset);
    }

    #[test]
    fn logged_in_users_do_not_affect_tick() {
        let config = make_config(0.15, 2);
        let with_users: Reading = Sample::new(0.01, 0, Some(3)).into();

        let (next, decision) = decide(MonitorState::new(), &with_users, &config);
        assert_eq!(next.idle_streak, 1);
        assert_eq!(decision, Decision::Continue);
    }

    #[test]
    fn single_required_interval_fires_on_first_idle_tick() {
        let config = make_config(0.15, 1);
        let (_, decision) = decide(MonitorState::new(), &reading(0.0, 0), &config);
        assert_eq!(decision, Decision::ShutdownCandidate);
    }

    #[test]
    fn streak_saturates() {
        let config = make_config(0.15, 3);
        let state = MonitorState {
            idle_streak: u32::MAX,
        };

        let (next, decision) = decide(state, &reading(0.0, 0), &config);
        assert_eq!(next.idle_streak, u32::MAX);
        assert_eq!(decision, Decision::ShutdownCandidate);
    }

    #[test]
    fn streak_never_exceeds_ticks_observed() {
        let config = make_config(0.15, 4);
        let readings: Vec<Reading> = (0..20)
            .map(|i| reading(if i % 7 == 6 { 1.0 } else { 0.0 }, 0))
            .collect();

        for (i, (streak, decision)) in run(&config, &readings).into_iter().enumerate() {
            assert!(streak as usize <= i + 1);
            assert_eq!(
                decision == Decision::ShutdownCandidate,
                streak >= config.required_idle_intervals
            );
        }
    }
}
