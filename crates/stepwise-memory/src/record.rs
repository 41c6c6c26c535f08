//! Step records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use stepwise_tools::ToolOutput;

use crate::action::Action;

/// What an iteration tried to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attempt", rename_all = "snake_case")]
pub enum Attempt {
    /// A decoded action
    Action { action: Action },

    /// A response line that did not parse
    Malformed { line: String },

    /// A model call that produced no line
    ModelCall,
}

impl Attempt {
    pub fn action(&self) -> Option<&Action> {
        match self {
            Self::Action { action } => Some(action),
            _ => None,
        }
    }
}

impl From<Action> for Attempt {
    fn from(action: Action) -> Self {
        Self::Action { action }
    }
}

/// Classified failure recorded for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ModelTimeout,
    ModelUnavailable,
    UnknownPrefix,
    MalformedPayload,
    MissingField,
    InvalidReasoningType,
    ToolNotFound,
    InvalidParams,
    ExecutionError,
}

impl FailureKind {
    pub fn is_model(&self) -> bool {
        matches!(self, Self::ModelTimeout | Self::ModelUnavailable)
    }

    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::UnknownPrefix
                | Self::MalformedPayload
                | Self::MissingField
                | Self::InvalidReasoningType
        )
    }

    /// The tool implementation was entered before failing
    pub fn reached_tool(&self) -> bool {
        matches!(self, Self::ExecutionError)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ModelTimeout => "model timeout",
            Self::ModelUnavailable => "model unavailable",
            Self::UnknownPrefix => "unknown prefix",
            Self::MalformedPayload => "malformed payload",
            Self::MissingField => "missing field",
            Self::InvalidReasoningType => "invalid reasoning type",
            Self::ToolNotFound => "tool not found",
            Self::InvalidParams => "invalid parameters",
            Self::ExecutionError => "execution error",
        };
        f.write_str(name)
    }
}

/// Why a step was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Duplicate,
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { result: ToolOutput },
    Failure { kind: FailureKind, reason: String },
    Skipped { reason: SkipReason },
}

impl Outcome {
    pub fn success(result: ToolOutput) -> Self {
        Self::Success { result }
    }

    pub fn failure<S: Into<String>>(kind: FailureKind, reason: S) -> Self {
        Self::Failure {
            kind,
            reason: reason.into(),
        }
    }

    pub fn duplicate() -> Self {
        Self::Skipped {
            reason: SkipReason::Duplicate,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Immutable log entry for one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position in the session history
    pub sequence: u64,
    pub attempt: Attempt,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}

impl StepRecord {
    /// The tool call this step attempted, if any
    pub fn tool_call(&self) -> Option<&crate::action::ToolCall> {
        self.attempt.action().and_then(Action::as_tool_call)
    }

    /// Whether this step belongs in the dedup set
    ///
    /// Successful and skipped calls count, and so do calls that entered the
    /// tool before failing, so no tool runs twice with the same arguments.
    pub fn marks_attempted(&self) -> bool {
        if self.tool_call().is_none() {
            return false;
        }
        match &self.outcome {
            Outcome::Success { .. } | Outcome::Skipped { .. } => true,
            Outcome::Failure { kind, .. } => kind.reached_tool(),
        }
    }
}
