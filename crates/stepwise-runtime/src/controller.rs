//! Decision cycle controller
//!
//! Each iteration renders the prompt from memory, calls the model under a
//! timeout, parses the line, dispatches tool calls that have not been tried
//! yet, records exactly one step, and asks the termination policy whether to
//! stop.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use stepwise_core::config::AgentSettings;
use stepwise_llm::{ModelError, ModelFailureKind, ModelProvider};
use stepwise_memory::{
    Action, Attempt, FailureKind, Outcome, Preferences, StepLogStore, StepMemory, StepRecord,
};
use stepwise_tools::{ToolError, ToolRegistry};

use crate::{
    error::{ProtocolViolation, RuntimeError},
    parser,
    prompt::{self, PromptContext},
    termination::{decide, IterationBudget, TerminationReason, Verdict},
    Result,
};

/// Consecutive model failures tolerated before giving up
pub const MODEL_RETRIES: usize = 1;

/// Configuration for controller behavior
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Maximum iterations per run (prevents infinite loops)
    pub max_iterations: usize,

    /// Deadline for one model call
    pub model_timeout: Duration,

    /// Tools whose success ends the run; empty disables the check
    pub required_tools: BTreeSet<String>,

    /// Name the model is addressed by
    pub agent_name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model_timeout: Duration::from_secs(10),
            required_tools: BTreeSet::new(),
            agent_name: "stepwise".to_string(),
        }
    }
}

impl From<&AgentSettings> for ControllerConfig {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            model_timeout: settings.model_timeout(),
            required_tools: settings.required_tools.iter().cloned().collect(),
            agent_name: settings.name.clone(),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalState {
    /// The model gave a final answer
    Answered { value: f64 },

    /// Every required tool succeeded
    StepsComplete { result: Option<f64> },

    /// The budget ran out; `partial` is the latest numeric tool result
    BudgetExhausted { partial: Option<f64> },

    /// The model failed twice in a row
    Uncertain { partial: Option<f64>, reason: String },
}

impl TerminalState {
    /// Best available number, confirmed or not
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Answered { value } => Some(*value),
            Self::StepsComplete { result } => *result,
            Self::BudgetExhausted { partial } | Self::Uncertain { partial, .. } => *partial,
        }
    }

    /// True only for an answer the model gave itself
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub state: TerminalState,

    /// Iterations spent in this run
    pub iterations: usize,

    /// Steps recorded during this run
    pub steps: Vec<StepRecord>,
}

/// Drives the model through the tool protocol
///
/// # Example
///
/// ```no_run
/// use stepwise_llm::GeminiProvider;
/// use stepwise_memory::StepMemory;
/// use stepwise_runtime::Controller;
/// use stepwise_tools::builtin::finance_toolbox;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let controller = Controller::builder()
///         .provider(GeminiProvider::new("your-api-key", "gemini-2.0-flash")?)
///         .tools(finance_toolbox()?.build())
///         .max_iterations(8)
///         .build()?;
///
///     let mut memory = StepMemory::new();
///     let outcome = controller
///         .solve("local", "Compound 10000 at 4.5% quarterly for 5 years", &mut memory, None)
///         .await?;
///     println!("{:?}", outcome.state);
///     Ok(())
/// }
/// ```
pub struct Controller {
    provider: Arc<dyn ModelProvider>,
    tools: ToolRegistry,
    step_log: Option<Arc<dyn StepLogStore>>,
    config: ControllerConfig,
}

impl Controller {
    /// Create a new controller builder
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn step_log(&self) -> Option<&Arc<dyn StepLogStore>> {
        self.step_log.as_ref()
    }

    /// Run the decision cycle until the termination policy stops it
    ///
    /// Model, parse, and tool failures are recorded as steps; they never
    /// turn into `Err`. Steps already in `memory` are part of the context and
    /// of the dedup index; completion and the partial result only look at the
    /// steps this run records.
    pub async fn solve(
        &self,
        session_id: &str,
        query: &str,
        memory: &mut StepMemory,
        preferences: Option<&Preferences>,
    ) -> Result<SessionOutcome> {
        if query.trim().is_empty() {
            return Err(RuntimeError::EmptyQuery);
        }

        let mut budget = IterationBudget::new(self.config.max_iterations)?;
        let first_step = memory.len();
        let mut model_failures = 0;

        tracing::info!(
            "Solving with budget {} in session {}: {}",
            budget.max(),
            session_id,
            query.trim()
        );

        loop {
            let iteration = budget.used() + 1;
            tracing::debug!("Iteration {}/{}", iteration, budget.max());

            let prompt = prompt::render(&PromptContext {
                agent_name: &self.config.agent_name,
                query,
                tools: &self.tools,
                memory: &*memory,
                preferences,
                strengthened: model_failures > 0,
            });

            let mut latest = None;
            match self.call_model(&prompt).await {
                Err(e) => {
                    model_failures += 1;
                    let kind = match e.kind() {
                        ModelFailureKind::Timeout => FailureKind::ModelTimeout,
                        ModelFailureKind::Unavailable => FailureKind::ModelUnavailable,
                    };
                    tracing::warn!(
                        "Model call failed in iteration {} ({}/{} retries used): {}",
                        iteration,
                        model_failures - 1,
                        MODEL_RETRIES,
                        e
                    );
                    memory.record(Attempt::ModelCall, Outcome::failure(kind, e.to_string()));
                }
                Ok(line) => {
                    model_failures = 0;
                    tracing::debug!("Model: {}", line);
                    match parser::parse(&line) {
                        Ok(action) => {
                            self.dispatch(&action, memory).await;
                            latest = Some(action);
                        }
                        Err(e) => {
                            tracing::warn!("Rejected model response in iteration {}: {}", iteration, e);
                            memory.record(
                                Attempt::Malformed { line },
                                Outcome::failure(e.kind(), e.to_string()),
                            );
                        }
                    }
                }
            }

            self.persist(session_id, memory).await;
            budget.consume();

            if model_failures > MODEL_RETRIES {
                tracing::error!("Model failed {} times in a row, giving up", model_failures);
                let reason = memory
                    .history()
                    .last()
                    .and_then(|record| match &record.outcome {
                        Outcome::Failure { reason, .. } => Some(reason.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();
                let state = TerminalState::Uncertain {
                    partial: memory.last_numeric_result_since(first_step),
                    reason,
                };
                return Ok(self.finish(state, &budget, memory, first_step));
            }

            match decide(
                latest.as_ref(),
                memory,
                first_step,
                &self.config.required_tools,
                budget.remaining(),
            ) {
                Verdict::Continue => continue,
                Verdict::Stop(reason) => {
                    let state = match reason {
                        TerminationReason::FinalAnswer(value) => TerminalState::Answered { value },
                        TerminationReason::StepsComplete => TerminalState::StepsComplete {
                            result: memory.last_numeric_result_since(first_step),
                        },
                        TerminationReason::BudgetExhausted => TerminalState::BudgetExhausted {
                            partial: memory.last_numeric_result_since(first_step),
                        },
                    };
                    return Ok(self.finish(state, &budget, memory, first_step));
                }
            }
        }
    }

    /// Call the model; the pending call is dropped when the deadline passes
    async fn call_model(&self, prompt: &str) -> std::result::Result<String, ModelError> {
        match tokio::time::timeout(self.config.model_timeout, self.provider.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout),
        }
    }

    /// Record the outcome of a valid action
    async fn dispatch(&self, action: &Action, memory: &mut StepMemory) {
        let outcome = match action {
            Action::FinalAnswer { value } => {
                tracing::info!("Final answer: {}", value);
                Outcome::success(stepwise_tools::ToolOutput::Number(*value))
            }
            Action::ToolCall(call) if memory.has_attempted(&call.name, &call.params) => {
                let violation = ProtocolViolation::DuplicateCall {
                    name: call.name.clone(),
                    params: call.params.clone(),
                };
                tracing::warn!("Skipping repeat call: {}", violation);
                Outcome::duplicate()
            }
            Action::ToolCall(call) => {
                tracing::info!("Executing tool: {} with params: {:?}", call.name, call.params);
                match self.tools.invoke(&call.name, &call.params).await {
                    Ok(result) => Outcome::success(result),
                    Err(e) => Outcome::failure(tool_failure_kind(&e), e.to_string()),
                }
            }
        };

        memory.record(action.clone(), outcome);
    }

    async fn persist(&self, session_id: &str, memory: &StepMemory) {
        let (Some(store), Some(record)) = (&self.step_log, memory.history().last()) else {
            return;
        };
        if let Err(e) = store.append_step(session_id, record).await {
            tracing::warn!(
                "Failed to persist step {} to {} store: {}",
                record.sequence,
                store.name(),
                e
            );
        }
    }

    fn finish(
        &self,
        state: TerminalState,
        budget: &IterationBudget,
        memory: &StepMemory,
        first_step: usize,
    ) -> SessionOutcome {
        tracing::info!(
            "Run finished after {} iteration(s): {:?}",
            budget.used(),
            state
        );
        SessionOutcome {
            state,
            iterations: budget.used(),
            steps: memory.history()[first_step..].to_vec(),
        }
    }
}

fn tool_failure_kind(error: &ToolError) -> FailureKind {
    match error {
        ToolError::NotFound(_) => FailureKind::ToolNotFound,
        ToolError::InvalidParameters(_) => FailureKind::InvalidParams,
        _ => FailureKind::ExecutionError,
    }
}

/// Builder for constructing a Controller
pub struct ControllerBuilder {
    provider: Option<Arc<dyn ModelProvider>>,
    tools: Option<ToolRegistry>,
    step_log: Option<Arc<dyn StepLogStore>>,
    config: ControllerConfig,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: None,
            step_log: None,
            config: ControllerConfig::default(),
        }
    }

    /// Set the model provider
    pub fn provider<P: ModelProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Set an already shared model provider
    pub fn shared_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Persist every step to this store
    pub fn step_log<S: StepLogStore + 'static>(mut self, store: S) -> Self {
        self.step_log = Some(Arc::new(store));
        self
    }

    /// Set the controller configuration
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set max iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn model_timeout(mut self, timeout: Duration) -> Self {
        self.config.model_timeout = timeout;
        self
    }

    pub fn required_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.required_tools = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn agent_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.agent_name = name.into();
        self
    }

    /// Build the controller
    pub fn build(self) -> Result<Controller> {
        let provider = self
            .provider
            .ok_or_else(|| RuntimeError::config("model provider not set"))?;

        if self.config.max_iterations == 0 {
            return Err(RuntimeError::config("max_iterations must be at least 1"));
        }
        if self.config.model_timeout.is_zero() {
            return Err(RuntimeError::config("model timeout must be positive"));
        }

        let tools = self.tools.unwrap_or_else(ToolRegistry::empty);
        for name in &self.config.required_tools {
            if !tools.has_tool(name) {
                return Err(RuntimeError::config(format!(
                    "required tool '{}' is not registered",
                    name
                )));
            }
        }

        Ok(Controller {
            provider,
            tools,
            step_log: self.step_log,
            config: self.config,
        })
    }
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
