//! Error types for tool operations

use stepwise_core::CoreError;

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors that can occur during tool lookup and invocation
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Parameters do not match the tool signature
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Tool ran and failed
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    /// Tool did not finish within its deadline
    #[error("Tool execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Tool already registered
    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    /// Generic error from stepwise-core
    #[error(transparent)]
    CoreError(#[from] CoreError),
}

impl ToolError {
    /// Create an execution error
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create an invalid parameters error
    pub fn invalid_params<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(tool_name: S) -> Self {
        Self::NotFound(tool_name.into())
    }

    /// True when the tool implementation was actually entered
    pub fn reached_tool(&self) -> bool {
        matches!(self, Self::ExecutionError(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_creation() {
        let err = ToolError::not_found("calculate_bonus");
        assert!(matches!(err, ToolError::NotFound(_)));
        assert_eq!(err.to_string(), "Tool not found: calculate_bonus");
    }

    #[test]
    fn test_invalid_params() {
        let err = ToolError::invalid_params("expected 2 parameters, got 1");
        assert!(matches!(err, ToolError::InvalidParameters(_)));
        assert!(!err.reached_tool());
    }

    #[test]
    fn test_reached_tool() {
        assert!(ToolError::execution("overflow").reached_tool());
        assert!(ToolError::Timeout(Duration::from_secs(1)).reached_tool());
        assert!(!ToolError::not_found("x").reached_tool());
    }
}
