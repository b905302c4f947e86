//! Error types for relmirror-core.

use thiserror::Error;

/// Errors raised while assembling [`crate::MirrorConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {var}")]
    Missing { var: &'static str },

    /// A variable is present but its value cannot be used.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
