//! Termination policy
//!
//! Three independent conditions end a run: an explicit final answer, every
//! required tool having succeeded, and the iteration budget running out.
//! [`decide`] is a pure function of its inputs, so replaying the same
//! history always yields the same verdict.

use std::collections::BTreeSet;
use stepwise_memory::{Action, StepMemory};

use crate::{error::RuntimeError, Result};

/// Fixed iteration allowance for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationBudget {
    max: usize,
    used: usize,
}

impl IterationBudget {
    pub fn new(max: usize) -> Result<Self> {
        if max == 0 {
            return Err(RuntimeError::config("iteration budget must be at least 1"));
        }
        Ok(Self { max, used: 0 })
    }

    /// Spend one iteration, returning what is left
    pub fn consume(&mut self) -> usize {
        self.used = (self.used + 1).min(self.max);
        self.remaining()
    }

    pub fn remaining(&self) -> usize {
        self.max - self.used
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminationReason {
    FinalAnswer(f64),
    StepsComplete,
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Continue,
    Stop(TerminationReason),
}

impl Verdict {
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

/// Decide whether to stop after an iteration
///
/// `latest` is the valid action decoded this iteration, if any, and
/// `run_start` is the index of the run's first step in `memory`. Conditions
/// are checked in order: final answer, completeness of this run (only for a
/// non-empty `required` set), then budget.
pub fn decide(
    latest: Option<&Action>,
    memory: &StepMemory,
    run_start: usize,
    required: &BTreeSet<String>,
    remaining: usize,
) -> Verdict {
    if let Some(Action::FinalAnswer { value }) = latest {
        return Verdict::Stop(TerminationReason::FinalAnswer(*value));
    }

    if !required.is_empty() && memory.is_complete_since(run_start, required) {
        return Verdict::Stop(TerminationReason::StepsComplete);
    }

    if remaining == 0 {
        return Verdict::Stop(TerminationReason::BudgetExhausted);
    }

    Verdict::Continue
}
