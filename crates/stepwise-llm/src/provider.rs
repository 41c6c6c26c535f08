//! Model provider trait definition

use async_trait::async_trait;

use crate::Result;

/// A text-in, text-out language model
///
/// The decision loop renders the whole context into one prompt and expects a
/// single protocol line back. Implementations must not retain state between
/// calls; cancellation is handled by the caller dropping the future.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate a completion for `prompt`
    ///
    /// # Example
    /// ```no_run
    /// use stepwise_llm::ModelProvider;
    ///
    /// async fn example(model: &dyn ModelProvider) -> Result<(), Box<dyn std::error::Error>> {
    ///     let line = model.generate("What is 2 + 2?").await?;
    ///     println!("{}", line);
    ///     Ok(())
    /// }
    /// ```
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model(&self) -> &str;

    /// Get the provider name
    fn name(&self) -> &str;
}
