//! Configuration errors
//!
//! The other crates wrap [`CoreError`] transparently, so a bad setting
//! surfaces with the key that caused it.

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Why a configuration could not be used
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A file or environment source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A setting holds a value the solver cannot run with
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl CoreError {
    /// Reject the value of `key`
    pub fn invalid<S: Into<String>>(key: &'static str, reason: S) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
