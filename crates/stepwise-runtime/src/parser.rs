//! Parser for the single-line model protocol
//!
//! A response is exactly one line in one of two forms:
//!
//! ```text
//! FUNCTION_CALL: {"function": "calculate_bonus", "params": ["10000", "0.005"], "reasoning_type": "arithmetic", "self_check": "bonus is 0.5% of principal"}
//! FINAL_ANSWER: 12458.32
//! ```
//!
//! [`parse`] is total: every input maps to one [`Action`] or one
//! [`ParseError`].

use serde_json::{Map, Value};
use stepwise_memory::{Action, FailureKind, ReasoningType, ToolCall};

pub const FUNCTION_CALL_PREFIX: &str = "FUNCTION_CALL:";
pub const FINAL_ANSWER_PREFIX: &str = "FINAL_ANSWER:";

/// Why a response line was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line starts with neither protocol prefix
    #[error("Unknown prefix: {0:?}")]
    UnknownPrefix(String),

    /// The payload after the prefix is not well formed
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A required field is absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// `reasoning_type` is not one of the known values
    #[error("Invalid reasoning type: {0:?}")]
    InvalidReasoningType(String),
}

impl ParseError {
    fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Failure kind recorded in step memory
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnknownPrefix(_) => FailureKind::UnknownPrefix,
            Self::MalformedPayload(_) => FailureKind::MalformedPayload,
            Self::MissingField(_) => FailureKind::MissingField,
            Self::InvalidReasoningType(_) => FailureKind::InvalidReasoningType,
        }
    }
}

/// Decode one model response line
pub fn parse(raw: &str) -> Result<Action, ParseError> {
    let line = raw.trim();

    let (payload, is_call) = if let Some(rest) = line.strip_prefix(FUNCTION_CALL_PREFIX) {
        (rest, true)
    } else if let Some(rest) = line.strip_prefix(FINAL_ANSWER_PREFIX) {
        (rest, false)
    } else {
        let head: String = line.lines().next().unwrap_or_default().chars().take(40).collect();
        return Err(ParseError::UnknownPrefix(head));
    };

    if payload.contains('\n') {
        return Err(ParseError::malformed("response spans more than one line"));
    }

    if is_call {
        parse_function_call(payload.trim())
    } else {
        parse_final_answer(payload.trim())
    }
}

fn parse_function_call(payload: &str) -> Result<Action, ParseError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| ParseError::malformed(format!("invalid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| ParseError::malformed("payload is not a JSON object"))?;

    let name = string_field(object, "function")?;
    if name.trim().is_empty() {
        return Err(ParseError::malformed("function name is empty"));
    }

    let params = object
        .get("params")
        .ok_or(ParseError::MissingField("params"))?
        .as_array()
        .ok_or_else(|| ParseError::malformed("params is not an array"))?
        .iter()
        .map(param_text)
        .collect::<Result<Vec<_>, _>>()?;

    let reasoning = string_field(object, "reasoning_type")?;
    let reasoning_type = ReasoningType::from_name(reasoning)
        .ok_or_else(|| ParseError::InvalidReasoningType(reasoning.to_string()))?;

    let self_check = string_field(object, "self_check")?;

    Ok(Action::ToolCall(
        ToolCall::new(name.trim(), params, reasoning_type).with_self_check(self_check),
    ))
}

fn string_field<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ParseError> {
    object
        .get(field)
        .ok_or(ParseError::MissingField(field))?
        .as_str()
        .ok_or_else(|| ParseError::malformed(format!("{} is not a string", field)))
}

/// Parameters travel as strings; bare JSON numbers keep their textual form
fn param_text(value: &Value) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ParseError::malformed(format!(
            "parameter {} is neither a string nor a number",
            other
        ))),
    }
}

fn parse_final_answer(payload: &str) -> Result<Action, ParseError> {
    if payload.is_empty() {
        return Err(ParseError::MissingField("value"));
    }

    let number = payload
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(payload)
        .trim();

    number
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| Action::FinalAnswer { value })
        .ok_or_else(|| ParseError::malformed(format!("final answer {:?} is not a number", payload)))
}
