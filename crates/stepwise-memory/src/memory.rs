//! Step memory: the append-only history of one session
//!
//! The record list is the single source of truth. The dedup index and the set
//! of succeeded tools are derived from it on every append and rebuilt from
//! scratch by [`StepMemory::restore`].

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use stepwise_tools::ToolOutput;

use crate::{
    action::{Action, ToolCall},
    error::MemoryError,
    record::{Attempt, Outcome, StepRecord},
    Result,
};

/// Ordered step log with a dedup index
///
/// # Example
///
/// ```
/// use stepwise_memory::{Action, Outcome, ReasoningType, StepMemory, ToolCall};
/// use stepwise_tools::ToolOutput;
///
/// let mut memory = StepMemory::new();
/// let call = ToolCall::new("calculate_compounding_periods", vec!["5".into()], ReasoningType::Arithmetic);
///
/// memory.record(Action::from(call), Outcome::success(ToolOutput::Integer(20)));
///
/// assert!(memory.has_attempted("calculate_compounding_periods", &["5".to_string()]));
/// assert!(memory.is_complete(["calculate_compounding_periods"]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StepMemory {
    records: Vec<StepRecord>,
    /// tool name -> parameter lists already tried, order-sensitive
    attempted: HashMap<String, HashSet<Vec<String>>>,
    succeeded: HashSet<String>,
}

impl StepMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a memory from persisted records
    ///
    /// Sequence numbers must run 1, 2, 3... without gaps.
    pub fn restore(records: Vec<StepRecord>) -> Result<Self> {
        let mut memory = Self::new();
        for record in records {
            let expected = memory.records.len() as u64 + 1;
            if record.sequence != expected {
                return Err(MemoryError::corrupt(format!(
                    "expected sequence {}, found {}",
                    expected, record.sequence
                )));
            }
            memory.index(&record);
            memory.records.push(record);
        }
        Ok(memory)
    }

    /// Append a step and update the derived indexes
    pub fn record(&mut self, attempt: impl Into<Attempt>, outcome: Outcome) -> &StepRecord {
        let record = StepRecord {
            sequence: self.records.len() as u64 + 1,
            attempt: attempt.into(),
            outcome,
            timestamp: Utc::now(),
        };

        tracing::debug!(
            "Recorded step {}: {:?}",
            record.sequence,
            record.outcome
        );

        self.index(&record);
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    fn index(&mut self, record: &StepRecord) {
        let Some(call) = record.tool_call() else {
            return;
        };

        if record.marks_attempted() {
            self.attempted
                .entry(call.name.clone())
                .or_default()
                .insert(call.params.clone());
        }
        if record.outcome.is_success() {
            self.succeeded.insert(call.name.clone());
        }
    }

    /// Whether `(name, params)` was already tried
    ///
    /// Parameter lists compare element by element, so `["1", "2"]` and
    /// `["2", "1"]` are different attempts.
    pub fn has_attempted(&self, name: &str, params: &[String]) -> bool {
        self.attempted
            .get(name)
            .map_or(false, |tried| tried.contains(params))
    }

    /// Read-only view of the history, oldest first
    pub fn history(&self) -> &[StepRecord] {
        &self.records
    }

    /// True when every required tool has at least one successful step
    ///
    /// An empty requirement set is trivially complete; callers decide whether
    /// that counts as a stopping condition.
    pub fn is_complete<I, S>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        required
            .into_iter()
            .all(|name| self.succeeded.contains(name.as_ref()))
    }

    /// Completeness judged on the steps from index `first` onwards
    ///
    /// A session keeps its memory across problems, so a run passes the index
    /// of its own first step to ignore successes from earlier problems.
    pub fn is_complete_since<I, S>(&self, first: usize, required: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let run = self.records.get(first..).unwrap_or_default();
        required.into_iter().all(|name| {
            run.iter().any(|record| {
                record.outcome.is_success()
                    && record
                        .tool_call()
                        .map_or(false, |call| call.name == name.as_ref())
            })
        })
    }

    /// Tools with at least one successful step
    pub fn succeeded_tools(&self) -> impl Iterator<Item = &str> {
        self.succeeded.iter().map(String::as_str)
    }

    /// The step that first settled each blocked `(name, params)` pair
    ///
    /// A pair runs at most once, so its first step is either the success or
    /// the failure inside the tool; later skips are not repeated here.
    pub fn attempted_steps(&self) -> Vec<&StepRecord> {
        let mut seen: HashSet<(&str, &[String])> = HashSet::new();
        self.records
            .iter()
            .filter(|record| record.marks_attempted())
            .filter(|record| {
                record
                    .tool_call()
                    .map_or(false, |call| seen.insert((call.name.as_str(), call.params.as_slice())))
            })
            .collect()
    }

    /// Calls the model must not repeat, in first-seen order
    pub fn forbidden_calls(&self) -> Vec<&ToolCall> {
        self.attempted_steps()
            .into_iter()
            .filter_map(StepRecord::tool_call)
            .collect()
    }

    /// Successful tool calls with their results, oldest first
    pub fn completed_calls(&self) -> impl Iterator<Item = (&ToolCall, &ToolOutput)> {
        self.records.iter().filter_map(|record| {
            match (record.tool_call(), &record.outcome) {
                (Some(call), Outcome::Success { result }) => Some((call, result)),
                _ => None,
            }
        })
    }

    /// Most recent numeric result from a tool, used as a partial answer
    pub fn last_numeric_result(&self) -> Option<f64> {
        self.last_numeric_result_since(0)
    }

    /// Most recent numeric tool result among the steps from `first` onwards
    pub fn last_numeric_result_since(&self, first: usize) -> Option<f64> {
        self.records
            .get(first..)
            .unwrap_or_default()
            .iter()
            .rev()
            .filter(|record| record.tool_call().is_some())
            .find_map(|record| match &record.outcome {
                Outcome::Success { result } => result.as_f64(),
                _ => None,
            })
    }

    /// The final answer, if one was recorded
    pub fn final_answer(&self) -> Option<f64> {
        self.records.iter().rev().find_map(|record| match record.attempt.action() {
            Some(Action::FinalAnswer { value }) => Some(*value),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clear the history and both indexes
    pub fn reset(&mut self) {
        tracing::info!("Resetting step memory ({} step(s) dropped)", self.records.len());
        self.records.clear();
        self.attempted.clear();
        self.succeeded.clear();
    }
}
