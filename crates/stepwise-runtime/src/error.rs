//! Error types for the decision loop

use stepwise_core::CoreError;
use stepwise_llm::ModelError;
use stepwise_memory::MemoryError;
use stepwise_tools::ToolError;

use crate::parser::ParseError;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Protocol rules the model broke without the session failing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    /// The same tool call was requested again
    #[error("Duplicate call: {name}({})", .params.join(", "))]
    DuplicateCall { name: String, params: Vec<String> },
}

/// Errors that can occur while running the solver
///
/// Model, parse and tool failures inside a session are recorded as steps
/// and never surface here. These variants cover misuse and configuration.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Model provider error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Tool registry error
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Step memory or store error
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    /// Response parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// Controller not configured properly
    #[error("Controller configuration error: {0}")]
    Configuration(String),

    /// Nothing to solve
    #[error("Query is empty")]
    EmptyQuery,

    /// Generic error from stepwise-core
    #[error(transparent)]
    CoreError(#[from] CoreError),
}

impl RuntimeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
}
