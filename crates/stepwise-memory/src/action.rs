//! Decoded model intents

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of thinking the model claims for a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningType {
    Arithmetic,
    Reasoning,
    Lookup,
}

impl ReasoningType {
    pub const ALL: [ReasoningType; 3] = [Self::Arithmetic, Self::Reasoning, Self::Lookup];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::Reasoning => "reasoning",
            Self::Lookup => "lookup",
        }
    }

    /// Case-insensitive match on the wire name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ReasoningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to run one registered tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Registered tool name
    pub name: String,

    /// Positional parameters in their textual form
    pub params: Vec<String>,

    pub reasoning_type: ReasoningType,

    /// The model's own note on how it will check the result
    pub self_check: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, params: Vec<String>, reasoning_type: ReasoningType) -> Self {
        Self {
            name: name.into(),
            params,
            reasoning_type,
            self_check: String::new(),
        }
    }

    pub fn with_self_check<S: Into<String>>(mut self, self_check: S) -> Self {
        self.self_check = self_check.into();
        self
    }
}

/// One decoded model response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    ToolCall(ToolCall),
    FinalAnswer { value: f64 },
}

impl Action {
    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Self::ToolCall(call) => Some(call),
            Self::FinalAnswer { .. } => None,
        }
    }

    pub fn is_final_answer(&self) -> bool {
        matches!(self, Self::FinalAnswer { .. })
    }
}

impl From<ToolCall> for Action {
    fn from(call: ToolCall) -> Self {
        Self::ToolCall(call)
    }
}
