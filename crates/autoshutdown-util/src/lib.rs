//! Shared utilities for autoshutdownd
//!
//! This crate provides:
//! - Time utilities (wall-clock now, human-readable durations)
//! - Error types
//! - Default paths for the configuration file

mod error;
mod paths;
mod time;

pub use error::*;
pub use paths::*;
pub use time::*;
