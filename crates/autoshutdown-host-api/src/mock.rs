//! Mock host for testing
//!
//! Each metric has a FIFO of scripted values. A probe pops the next value
//! for its metric, falling back to the metric's default once the script is
//! exhausted. Sleeps return immediately and are recorded.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::{
    HostError, HostResult, PlatformDetector, PlatformKind, SampleSource, ShutdownAction, Sleeper,
};

type Scripted<T> = Mutex<VecDeque<Result<T, String>>>;

/// Mock host adapter for unit/integration testing
pub struct MockHost {
    platform: PlatformKind,

    loads: Scripted<f64>,
    ssh_sessions: Scripted<u32>,
    logged_in_users: Scripted<u32>,

    default_load: Mutex<f64>,
    default_ssh_sessions: Mutex<u32>,
    default_logged_in_users: Mutex<u32>,

    /// Configure power-off to fail
    pub fail_power_off: Mutex<bool>,

    power_off_calls: AtomicU32,
    sleeps: Mutex<Vec<Duration>>,
}

impl MockHost {
    /// An idle generic host: zero load, no sessions, no users
    pub fn new() -> Self {
        Self {
            platform: PlatformKind::Generic,
            loads: Mutex::new(VecDeque::new()),
            ssh_sessions: Mutex::new(VecDeque::new()),
            logged_in_users: Mutex::new(VecDeque::new()),
            default_load: Mutex::new(0.0),
            default_ssh_sessions: Mutex::new(0),
            default_logged_in_users: Mutex::new(0),
            fail_power_off: Mutex::new(false),
            power_off_calls: AtomicU32::new(0),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn with_platform(mut self, platform: PlatformKind) -> Self {
        self.platform = platform;
        self
    }

    /// Script the next load average read
    pub fn push_load(&self, load: f64) {
        self.loads.lock().unwrap().push_back(Ok(load));
    }

    /// Script the next SSH session count
    pub fn push_ssh_sessions(&self, count: u32) {
        self.ssh_sessions.lock().unwrap().push_back(Ok(count));
    }

    /// Script the next logged-in user count
    pub fn push_logged_in_users(&self, count: u32) {
        self.logged_in_users.lock().unwrap().push_back(Ok(count));
    }

    /// Script a failure for the next load average read
    pub fn fail_next_load(&self, message: impl Into<String>) {
        self.loads.lock().unwrap().push_back(Err(message.into()));
    }

    /// Script a failure for the next SSH session count
    pub fn fail_next_ssh_sessions(&self, message: impl Into<String>) {
        self.ssh_sessions.lock().unwrap().push_back(Err(message.into()));
    }

    /// Script a failure for the next logged-in user count
    pub fn fail_next_logged_in_users(&self, message: impl Into<String>) {
        self.logged_in_users
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
    }

    pub fn set_default_load(&self, load: f64) {
        *self.default_load.lock().unwrap() = load;
    }

    pub fn set_default_ssh_sessions(&self, count: u32) {
        *self.default_ssh_sessions.lock().unwrap() = count;
    }

    pub fn set_default_logged_in_users(&self, count: u32) {
        *self.default_logged_in_users.lock().unwrap() = count;
    }

    /// Number of times `power_off` was called
    pub fn power_off_calls(&self) -> u32 {
        self.power_off_calls.load(Ordering::SeqCst)
    }

    /// Every duration passed to `sleep`, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

fn next_value<T: Copy>(script: &Scripted<T>, default: &Mutex<T>) -> HostResult<T> {
    match script.lock().unwrap().pop_front() {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(HostError::Internal(message)),
        None => Ok(*default.lock().unwrap()),
    }
}

#[async_trait]
impl SampleSource for MockHost {
    async fn read_load(&self) -> HostResult<f64> {
        next_value(&self.loads, &self.default_load)
    }

    async fn count_ssh_sessions(&self) -> HostResult<u32> {
        next_value(&self.ssh_sessions, &self.default_ssh_sessions)
    }

    async fn count_logged_in_users(&self) -> HostResult<u32> {
        next_value(&self.logged_in_users, &self.default_logged_in_users)
    }
}

#[async_trait]
impl ShutdownAction for MockHost {
    async fn power_off(&self) -> HostResult<()> {
        self.power_off_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_power_off.lock().unwrap() {
            return Err(HostError::command_failed("mock poweroff", "Mock power-off failure"));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "mock poweroff".to_string()
    }
}

#[async_trait]
impl PlatformDetector for MockHost {
    async fn detect(&self) -> PlatformKind {
        self.platform
    }
}

#[async_trait]
impl Sleeper for MockHost {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
