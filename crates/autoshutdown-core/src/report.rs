//! Operator-facing status lines and startup banner

use autoshutdown_config::MonitorConfig;
use autoshutdown_host_api::Reading;
use autoshutdown_util::{format_duration, format_duration_long};
use std::fmt;

use crate::MonitorState;

/// One line per tick summarizing the reading and the idle streak
pub struct StatusLine<'a> {
    pub tick: u64,
    pub state: MonitorState,
    pub reading: &'a Reading,
    pub config: &'a MonitorConfig,
}

impl fmt::Display for StatusLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config;
        let idle_for = config.interval.saturating_mul(self.state.idle_streak);

        write!(
            f,
            "Tick {} | Interval count: {}/{} (idle {})",
            self.tick,
            self.state.idle_streak,
            config.required_idle_intervals,
            format_duration(idle_for)
        )?;

        match self.reading {
            Reading::Sample(sample) => {
                let label = if sample.load >= config.load_threshold {
                    "active"
                } else {
                    "idle"
                };
                write!(
                    f,
                    " | System load (5min avg): {:.3} (threshold: {:.3}, {}) | SSH users: {} | Logged-in users: ",
                    sample.load, config.load_threshold, label, sample.ssh_sessions
                )?;
                match sample.logged_in_users {
                    Some(users) => write!(f, "{}", users),
                    None => write!(f, "?"),
                }
            }
            Reading::Unavailable { reason } => {
                write!(f, " | Sample unavailable: {}", reason)
            }
        }
    }
}

/// Startup banner describing the shutdown criteria
pub fn banner_lines(config: &MonitorConfig, action: &str) -> Vec<String> {
    vec![
        "Purpose: Shut down the machine when it has been idle for a while".to_string(),
        "Shutdown criteria:".to_string(),
        format!(
            "  - System load (5 min average) below {:.2}",
            config.load_threshold
        ),
        "  - No established SSH sessions".to_string(),
        format!(
            "  - For {} consecutive intervals of {}",
            config.required_idle_intervals,
            format_duration_long(config.interval)
        ),
        format!(
            "  - Minimum idle time before shutdown: {}",
            format_duration_long(config.min_idle_before_shutdown())
        ),
        "Additional checks:".to_string(),
        "  - No logged-in users at the moment of shutdown".to_string(),
        "Shutdown process:".to_string(),
        format!(
            "  - {} grace period before power-off ({})",
            format_duration_long(config.shutdown_grace),
            action
        ),
        "Initiating monitoring loop...".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoshutdown_host_api::Sample;
    use std::time::Duration;

    fn make_config() -> MonitorConfig {
        MonitorConfig {
            load_threshold: 0.15,
            required_idle_intervals: 15,
            interval: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(300),
            initial_delay: Duration::ZERO,
        }
    }

    #[test]
    fn status_line_for_sample() {
        let config = make_config();
        let reading: Reading = Sample::new(0.05, 0, Some(1)).into();
        let line = StatusLine {
            tick: 4,
            state: MonitorState { idle_streak: 3 },
            reading: &reading,
            config: &config,
        };

        assert_eq!(
            line.to_string(),
            "Tick 4 | Interval count: 3/15 (idle 1m 30s) | System load (5min avg): 0.050 \
             (threshold: 0.150, idle) | SSH users: 0 | Logged-in users: 1"
        );
    }

    #[test]
    fn status_line_marks_high_load_and_unknown_users() {
        let config = make_config();
        let reading: Reading = Sample::new(0.5, 2, None).into();
        let line = StatusLine {
            tick: 1,
            state: MonitorState::new(),
            reading: &reading,
            config: &config,
        }
        .to_string();

        assert!(line.contains("threshold: 0.150, active"));
        assert!(line.contains("SSH users: 2"));
        assert!(line.ends_with("Logged-in users: ?"));
    }

    #[test]
    fn status_line_for_unavailable_reading() {
        let config = make_config();
        let reading = Reading::unavailable("load average: permission denied");
        let line = StatusLine {
            tick: 2,
            state: MonitorState::new(),
            reading: &reading,
            config: &config,
        };

        assert_eq!(
            line.to_string(),
            "Tick 2 | Interval count: 0/15 (idle 0s) | Sample unavailable: load average: permission denied"
        );
    }

    #[test]
    fn banner_describes_criteria() {
        let lines = banner_lines(&make_config(), "sudo poweroff");

        assert!(lines.contains(&"  - System load (5 min average) below 0.15".to_string()));
        assert!(lines.contains(&"  - For 15 consecutive intervals of 30 seconds".to_string()));
        assert!(lines.contains(&"  - Minimum idle time before shutdown: 7 minutes and 30 seconds".to_string()));
        assert!(lines.contains(&"  - 5 minutes grace period before power-off (sudo poweroff)".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Initiating monitoring loop..."));
    }
}
