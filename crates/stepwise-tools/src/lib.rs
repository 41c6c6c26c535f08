//! Tool Registry
//!
//! This crate provides the named calculation tools a model may call, each
//! with a fixed signature that is checked before the tool runs.
//!
//! # Example
//!
//! ```
//! use stepwise_tools::builtin::finance_toolbox;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = finance_toolbox()?.build();
//!
//!     let periods = registry
//!         .invoke("calculate_compounding_periods", &["5".to_string()])
//!         .await?;
//!     assert_eq!(periods.to_string(), "20");
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod registry;
pub mod signature;
pub mod tool;

// Built-in tools
pub mod builtin;

// Re-exports
pub use error::{Result, ToolError};
pub use registry::{ToolRegistry, ToolRegistryBuilder, DEFAULT_TOOL_TIMEOUT};
pub use signature::{Arg, ParamKind, ParamSpec, ResultKind, ToolSignature};
pub use tool::{FnTool, Tool, ToolOutput};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let registry = ToolRegistry::empty();
        assert_eq!(registry.count(), 0);
        assert_eq!(registry.timeout(), DEFAULT_TOOL_TIMEOUT);
    }
}
