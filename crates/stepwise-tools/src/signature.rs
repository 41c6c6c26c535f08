//! Tool signatures and parameter validation
//!
//! The model passes every parameter as a string. A [`ToolSignature`] fixes
//! the arity and the kind of each position, and [`ToolSignature::validate`]
//! turns the raw strings into typed [`Arg`]s before anything runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{error::ToolError, Result};

/// Kind of a single positional parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Finite floating point number
    Number,
    /// Whole number; "20" and "20.0" are accepted, "20.5" is not
    Integer,
    /// Free text, passed through unchanged
    String,
}

/// Kind of value a tool produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Number,
    Integer,
    Boolean,
    Structured,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Integer => write!(f, "integer"),
            Self::String => write!(f, "string"),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
            Self::Structured => write!(f, "object"),
        }
    }
}

/// A named positional parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
}

/// Immutable description of a tool's interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSignature {
    /// Unique tool name
    pub name: String,

    /// Human-readable description, shown to the model
    pub description: String,

    /// Ordered parameters
    pub params: Vec<ParamSpec>,

    /// Kind of the produced value
    pub result: ResultKind,
}

impl ToolSignature {
    /// Start a signature with no parameters
    pub fn new(name: impl Into<String>, result: ResultKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            result,
        }
    }

    /// Append a positional parameter
    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
        });
        self
    }

    /// Set description
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Check arity and kinds, converting raw strings into typed arguments
    pub fn validate(&self, raw: &[String]) -> Result<Vec<Arg>> {
        if raw.len() != self.arity() {
            return Err(ToolError::invalid_params(format!(
                "{} expects {} parameter(s), got {}",
                self.name,
                self.arity(),
                raw.len()
            )));
        }

        self.params
            .iter()
            .zip(raw)
            .map(|(spec, value)| convert(spec, value))
            .collect()
    }

    /// One-line description used in the tool catalogue
    ///
    /// `calculate_bonus(principal: number, bonus_rate: number) -> number: Calculate ...`
    pub fn describe(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.kind))
            .collect::<Vec<_>>()
            .join(", ");

        if self.description.is_empty() {
            format!("{}({}) -> {}", self.name, params, self.result)
        } else {
            format!(
                "{}({}) -> {}: {}",
                self.name, params, self.result, self.description
            )
        }
    }
}

fn convert(spec: &ParamSpec, value: &str) -> Result<Arg> {
    let trimmed = value.trim();
    match spec.kind {
        ParamKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Arg::Number)
            .ok_or_else(|| {
                ToolError::invalid_params(format!(
                    "parameter '{}' expects a number, got '{}'",
                    spec.name, value
                ))
            }),
        ParamKind::Integer => parse_integer(trimmed).map(Arg::Integer).ok_or_else(|| {
            ToolError::invalid_params(format!(
                "parameter '{}' expects an integer, got '{}'",
                spec.name, value
            ))
        }),
        ParamKind::String => Ok(Arg::Text(value.to_string())),
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let float = value.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

/// A validated argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Number(f64),
    Integer(i64),
    Text(String),
}

impl Arg {
    /// Numeric view; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(*i as f64),
            Self::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}
