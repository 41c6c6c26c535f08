//! Decision Cycle Runtime
//!
//! This crate drives a language model through the tool protocol: it parses
//! each response line, refuses repeat calls, runs tools, records every step,
//! and stops on a final answer, on completed required steps, or when the
//! iteration budget runs out.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stepwise_llm::create_provider;
//! use stepwise_runtime::{Controller, Session, SessionCommand, SessionReply};
//! use stepwise_tools::builtin::finance_toolbox;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = create_provider("gemini", "your-api-key", "gemini-2.0-flash")?;
//!     let controller = Controller::builder()
//!         .shared_provider(provider.into())
//!         .tools(finance_toolbox()?.build())
//!         .build()?;
//!
//!     let mut session = Session::new(Arc::new(controller));
//!     if let Some(command) = SessionCommand::parse("Compound 10000 at 4.5% quarterly for 5 years") {
//!         if let SessionReply::Solved(outcome) = session.handle(command).await? {
//!             println!("{:?}", outcome.state);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod session;
pub mod termination;

// Re-exports
pub use controller::{
    Controller, ControllerBuilder, ControllerConfig, SessionOutcome, TerminalState, MODEL_RETRIES,
};
pub use error::{ProtocolViolation, Result, RuntimeError};
pub use parser::{parse, ParseError};
pub use session::{Session, SessionCommand, SessionReply};
pub use termination::{decide, IterationBudget, TerminationReason, Verdict};
