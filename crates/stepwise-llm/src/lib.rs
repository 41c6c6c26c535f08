//! Model Provider Boundary
//!
//! The decision loop sees a language model as a single async function from
//! prompt text to completion text. This crate defines that boundary and the
//! HTTP providers behind it.
//!
//! # Example
//!
//! ```no_run
//! use stepwise_llm::{GeminiProvider, ModelProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GeminiProvider::new("your-api-key", "gemini-2.0-flash")?;
//!     let line = provider.generate("FINAL_ANSWER or FUNCTION_CALL?").await?;
//!     println!("{}", line);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod provider;

mod http;

// Provider implementations
pub mod gemini;
pub mod openai;

// Re-exports
pub use error::{ModelError, ModelFailureKind, Result};
pub use provider::ModelProvider;

pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

/// Create a provider from configuration
pub fn create_provider(
    provider_name: &str,
    api_key: &str,
    model: &str,
) -> Result<Box<dyn ModelProvider>> {
    match provider_name.to_lowercase().as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(api_key, model)?)),
        "openai" => Ok(Box::new(OpenAIProvider::new(api_key, model)?)),
        _ => Err(ModelError::UnsupportedProvider(provider_name.to_string())),
    }
}
