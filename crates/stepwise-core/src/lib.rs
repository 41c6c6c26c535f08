//! Stepwise Core
//!
//! Error handling, configuration, and logging setup shared by the solver
//! crates.

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{load_config, StepwiseConfig};
pub use error::{CoreError, Result};
pub use logging::{init_logging, LogConfig};
