//! Error types for step memory and persisted state

use stepwise_core::CoreError;

/// Result type for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors that can occur while persisting or restoring state
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Nothing stored under this key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// A restored log does not form a valid history
    #[error("Corrupt step log: {0}")]
    Corrupt(String),

    /// Generic error from stepwise-core
    #[error(transparent)]
    CoreError(#[from] CoreError),
}

impl MemoryError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound(key.into())
    }

    /// Create a corrupt log error
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Self::Corrupt(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MemoryError::not_found("session-1");
        assert!(matches!(err, MemoryError::NotFound(_)));
        assert_eq!(err.to_string(), "Not found: session-1");
    }

    #[test]
    fn test_corrupt_error() {
        let err = MemoryError::corrupt("sequence 3 follows 1");
        assert_eq!(err.to_string(), "Corrupt step log: sequence 3 follows 1");
    }
}
