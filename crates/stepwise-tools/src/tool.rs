//! Tool trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::{
    signature::{Arg, ResultKind, ToolSignature},
    Result,
};

/// Value produced by a successful tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolOutput {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Structured(Value),
}

impl ToolOutput {
    /// Kind of this value, checked against the tool signature
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Number(_) => ResultKind::Number,
            Self::Integer(_) => ResultKind::Integer,
            Self::Boolean(_) => ResultKind::Boolean,
            Self::Structured(_) => ResultKind::Structured,
        }
    }

    /// Numeric view, used for partial answers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Structured(v) => write!(f, "{}", v),
        }
    }
}

/// Trait for calculation tools the model can call
///
/// Implementations receive arguments that already match their signature;
/// the registry rejects anything else before `call` runs.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's interface
    fn signature(&self) -> &ToolSignature;

    /// Get the tool's unique name
    fn name(&self) -> &str {
        &self.signature().name
    }

    /// Run the tool
    async fn call(&self, args: &[Arg]) -> Result<ToolOutput>;
}

type ToolFn = dyn Fn(&[Arg]) -> Result<ToolOutput> + Send + Sync;

/// A tool backed by a plain function
///
/// # Example
///
/// ```
/// use stepwise_tools::{FnTool, ParamKind, ResultKind, ToolOutput, ToolSignature};
///
/// let double = FnTool::new(
///     ToolSignature::new("double", ResultKind::Number).param("x", ParamKind::Number),
///     |args| Ok(ToolOutput::Number(args[0].as_f64().unwrap_or_default() * 2.0)),
/// );
/// ```
#[derive(Clone)]
pub struct FnTool {
    signature: ToolSignature,
    func: Arc<ToolFn>,
}

impl FnTool {
    pub fn new<F>(signature: ToolSignature, func: F) -> Self
    where
        F: Fn(&[Arg]) -> Result<ToolOutput> + Send + Sync + 'static,
    {
        Self {
            signature,
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, args: &[Arg]) -> Result<ToolOutput> {
        (self.func)(args)
    }
}
