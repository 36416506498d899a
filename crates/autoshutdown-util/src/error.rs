//! Error types for autoshutdownd

use thiserror::Error;

/// Top-level error type for daemon operations that are not owned by a
/// more specific crate (config, host adapters).
#[derive(Debug, Error)]
pub enum AutoShutdownError {
    #[error("This tool only works on {required} VMs, aborting ...")]
    PlatformMismatch { required: String, detected: String },
}

impl AutoShutdownError {
    pub fn platform_mismatch(required: impl Into<String>, detected: impl Into<String>) -> Self {
        Self::PlatformMismatch {
            required: required.into(),
            detected: detected.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AutoShutdownError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_mismatch_message() {
        let err = AutoShutdownError::platform_mismatch("GCE", "Generic");
        assert_eq!(err.to_string(), "This tool only works on GCE VMs, aborting ...");
    }
}
