//! Per-tick measurements handed to the decision engine

use chrono::{DateTime, Local};

/// One tick's worth of system metrics
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// 5-minute load average
    pub load: f64,

    /// Established inbound connections on the SSH port
    pub ssh_sessions: u32,

    /// Active login sessions (console + remote).
    ///
    /// Display only at tick time; `None` when the count could not be read.
    pub logged_in_users: Option<u32>,

    /// When the sample was taken
    pub taken_at: DateTime<Local>,
}

impl Sample {
    pub fn new(load: f64, ssh_sessions: u32, logged_in_users: Option<u32>) -> Self {
        Self {
            load,
            ssh_sessions,
            logged_in_users,
            taken_at: autoshutdown_util::now(),
        }
    }
}

/// Outcome of sampling the host for one tick.
///
/// A failed probe is carried as `Unavailable` instead of being coerced to
/// zero, so missing data can never look like an idle machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Sample(Sample),
    Unavailable { reason: String },
}

impl Reading {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// The sample, if one was taken
    pub fn sample(&self) -> Option<&Sample> {
        match self {
            Reading::Sample(sample) => Some(sample),
            Reading::Unavailable { .. } => None,
        }
    }
}

impl From<Sample> for Reading {
    fn from(sample: Sample) -> Self {
        Reading::Sample(sample)
    }
}
