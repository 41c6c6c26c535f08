//! Step Memory
//!
//! This crate owns what a session remembers: the decoded actions, the
//! append-only step history with its dedup index, and the stores that
//! persist step logs and user preferences.
//!
//! # Example
//!
//! ```
//! use stepwise_memory::{InMemoryStepLog, StepLogStore, StepMemory, Attempt, Outcome, FailureKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryStepLog::new();
//!     let mut memory = StepMemory::new();
//!
//!     let step = memory.record(Attempt::ModelCall, Outcome::failure(FailureKind::ModelTimeout, "timed out"));
//!     store.append_step("session-1", step).await?;
//!
//!     let restored = stepwise_memory::replay(&store.load("session-1").await?)?;
//!     assert_eq!(restored.len(), 1);
//!
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod error;
pub mod memory;
pub mod preferences;
pub mod record;
pub mod store;

// Re-exports
pub use action::{Action, ReasoningType, ToolCall};
pub use error::{MemoryError, Result};
pub use memory::StepMemory;
pub use preferences::{
    InMemoryPreferenceStore, JsonPreferenceStore, PreferenceStore, Preferences, AGENT_NAME_KEY,
};
pub use record::{Attempt, FailureKind, Outcome, SkipReason, StepRecord};
pub use store::{replay, InMemoryStepLog, JsonlStepLog, LogEntry, StepLogStore};
