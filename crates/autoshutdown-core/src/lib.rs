//! Core idle-detection engine for autoshutdownd
//!
//! This crate is the heart of autoshutdownd, containing:
//! - The idle decision engine (idle-streak hysteresis)
//! - The shutdown executor (final re-check, grace delay, power-off)
//! - The monitor loop tying sampling, decisions, and shutdown together
//! - Operator-facing status and banner rendering
//!
//! State machine: Monitoring -> ShutdownPending -> Terminated. A shutdown
//! candidate whose re-check fails goes back to Monitoring with a fresh
//! streak; once the grace window begins there is no way back.

mod engine;
mod executor;
mod monitor;
mod report;

pub use engine::*;
pub use executor::*;
pub use monitor::*;
pub use report::*;
