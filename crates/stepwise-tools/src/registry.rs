//! Tool registry for looking up and invoking tools
//!
//! A registry is assembled once through [`ToolRegistryBuilder`] and is
//! read-only afterwards, so lookups have no side effects and clones share
//! the same tool set.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::ToolError,
    signature::ToolSignature,
    tool::{Tool, ToolOutput},
    Result,
};

/// Default deadline for a single tool call
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only registry of named tools
#[derive(Clone)]
pub struct ToolRegistry {
    /// Map of tool name to tool implementation, ordered for stable catalogues
    tools: Arc<BTreeMap<String, Arc<dyn Tool>>>,
    /// Deadline applied to every call
    timeout: Duration,
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// A registry with no tools
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Signature of a registered tool
    pub fn lookup(&self, name: &str) -> Result<&ToolSignature> {
        self.tools
            .get(name)
            .map(|tool| tool.signature())
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Validate `params` against the signature, then run the tool
    ///
    /// Arity and kind mismatches fail with [`ToolError::InvalidParameters`]
    /// without entering the tool. A call that outlives the registry timeout
    /// is dropped and reported as [`ToolError::Timeout`].
    pub async fn invoke(&self, name: &str, params: &[String]) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;

        let signature = tool.signature();
        let args = signature.validate(params)?;

        tracing::debug!("Invoking tool: {} with params: {:?}", name, params);

        let output = match tokio::time::timeout(self.timeout, tool.call(&args)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Tool {} timed out after {:?}", name, self.timeout);
                return Err(ToolError::Timeout(self.timeout));
            }
        };

        match output {
            Ok(value) if value.kind() != signature.result => {
                tracing::error!(
                    "Tool {} returned {} but declares {}",
                    name,
                    value.kind(),
                    signature.result
                );
                Err(ToolError::execution(format!(
                    "{} returned {} instead of {}",
                    name,
                    value.kind(),
                    signature.result
                )))
            }
            Ok(ToolOutput::Number(n)) if !n.is_finite() => {
                tracing::error!("Tool {} produced a non-finite number", name);
                Err(ToolError::execution(format!("{} produced {}", name, n)))
            }
            Ok(value) => {
                tracing::debug!("Tool {} returned {}", name, value);
                Ok(value)
            }
            Err(e) => {
                tracing::error!("Tool {} execution failed: {}", name, e);
                Err(e)
            }
        }
    }

    /// List all registered tool names in sorted order
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// All signatures in sorted order
    pub fn signatures(&self) -> impl Iterator<Item = &ToolSignature> {
        self.tools.values().map(|tool| tool.signature())
    }

    /// Get the number of registered tools
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Numbered tool catalogue for prompts
    pub fn catalogue(&self) -> String {
        if self.tools.is_empty() {
            return "No tools available.".to_string();
        }

        self.signatures()
            .enumerate()
            .map(|(i, sig)| format!("{}. {}", i + 1, sig.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Deadline applied to each call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder for [`ToolRegistry`]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Register a tool
    ///
    /// # Returns
    /// Error if a tool with the same name is already registered
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<&mut Self> {
        let name = tool.name().to_string();

        if self.tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered(name));
        }

        tracing::debug!("Registered tool: {}", name);
        self.tools.insert(name, Arc::new(tool));
        Ok(self)
    }

    /// Register several tools, stopping at the first duplicate
    pub fn register_all<T, I>(&mut self, tools: I) -> Result<&mut Self>
    where
        T: Tool + 'static,
        I: IntoIterator<Item = T>,
    {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(self)
    }

    /// Set the per-call deadline
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Freeze the registry
    pub fn build(&mut self) -> ToolRegistry {
        let tools = std::mem::take(&mut self.tools);
        tracing::info!("Tool registry built with {} tool(s)", tools.len());
        ToolRegistry {
            tools: Arc::new(tools),
            timeout: self.timeout,
        }
    }
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
