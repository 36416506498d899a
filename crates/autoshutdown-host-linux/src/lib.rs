//! Linux host adapter for autoshutdownd
//!
//! Provides:
//! - Load average, SSH session, and login session probes
//! - Power-off via an external command, or a dry-run stand-in
//! - Cloud platform detection through instance metadata endpoints

mod metadata;
mod power;
mod probes;
mod process;

pub use metadata::*;
pub use power::*;
pub use probes::*;
pub use process::*;
