//! Host adapter trait interfaces for autoshutdownd
//!
//! This crate defines the interface between the monitoring core and
//! platform-specific implementations: where samples come from, how the
//! machine is powered off, and which cloud platform we are running on.
//! It contains no platform code itself.

mod mock;
mod platform;
mod sample;
mod traits;

pub use mock::*;
pub use platform::*;
pub use sample::*;
pub use traits::*;
