//! Prompt rendering
//!
//! Every iteration sends the whole context again: the directive with the
//! tool catalogue, the problem, the step history, and the calls that must
//! not be repeated.

use std::fmt::Write;
use stepwise_memory::{Action, Attempt, Outcome, Preferences, StepMemory, StepRecord, ToolCall};
use stepwise_tools::ToolRegistry;

use crate::parser::{FINAL_ANSWER_PREFIX, FUNCTION_CALL_PREFIX};

/// Inputs for one prompt
pub struct PromptContext<'a> {
    pub agent_name: &'a str,
    pub query: &'a str,
    pub tools: &'a ToolRegistry,
    pub memory: &'a StepMemory,
    pub preferences: Option<&'a Preferences>,
    /// Set after a failed model call
    pub strengthened: bool,
}

/// Render the full prompt text
pub fn render(ctx: &PromptContext<'_>) -> String {
    let mut prompt = directive(ctx.agent_name, ctx.tools);

    if let Some(block) = ctx.preferences.map(Preferences::to_prompt) {
        if !block.is_empty() {
            prompt.push('\n');
            prompt.push_str(&block);
        }
    }

    let _ = write!(prompt, "\nProblem: {}\n", ctx.query.trim());

    if !ctx.memory.is_empty() {
        prompt.push_str("\nPrevious steps:\n");
        for record in ctx.memory.history() {
            prompt.push_str(&history_line(record));
            prompt.push('\n');
        }
    }

    let (completed, failed): (Vec<_>, Vec<_>) = ctx
        .memory
        .attempted_steps()
        .into_iter()
        .partition(|step| step.outcome.is_success());
    call_block(
        &mut prompt,
        "COMPLETED STEPS (DO NOT CALL THESE FUNCTIONS AGAIN):",
        &completed,
    );
    call_block(&mut prompt, "FAILED STEPS (DO NOT RETRY):", &failed);

    let mut results = ctx.memory.completed_calls().peekable();
    if results.peek().is_some() {
        prompt.push_str("\nFUNCTION RESULTS:\n");
        for (call, result) in results {
            let _ = writeln!(prompt, "- {} = {}", call_signature(call), result);
        }
    }

    if ctx.strengthened {
        prompt.push_str(&strengthened_directive(&ctx.memory.forbidden_calls()));
    }

    prompt.push_str("\nWhat should be the next step?");
    prompt
}

fn directive(agent_name: &str, tools: &ToolRegistry) -> String {
    format!(
        "You are {agent}, a math agent solving problems in iterations. \
         You have access to these tools:\n\
         {catalogue}\n\n\
         Respond with EXACTLY ONE line in one of these formats:\n\
         1. {call} {{\"function\": \"function_name\", \"params\": [\"param1\", \"param2\"], \"reasoning_type\": \"arithmetic|reasoning|lookup\", \"self_check\": \"how you will check the result\"}}\n\
         2. {answer} [number]\n\n\
         Rules:\n\
         - The line must start with {call} or {answer} and nothing else may follow it.\n\
         - The JSON must be valid and on a single line.\n\
         - Pass every parameter as a string, in the order the tool declares.\n\
         - Never repeat a call listed under COMPLETED STEPS or FAILED STEPS.\n\
         - When the result is known, respond with {answer}.\n\n\
         Examples:\n\
         {call} {{\"function\": \"calculate_quarterly_rate\", \"params\": [\"0.045\"], \"reasoning_type\": \"arithmetic\", \"self_check\": \"quarterly rate is below the annual rate\"}}\n\
         {call} {{\"function\": \"verify_calculation\", \"params\": [\"12507.51\", \"10000\"], \"reasoning_type\": \"reasoning\", \"self_check\": \"final amount shows growth\"}}\n\
         {answer} [12507.51]\n",
        agent = agent_name,
        catalogue = tools.catalogue(),
        call = FUNCTION_CALL_PREFIX,
        answer = FINAL_ANSWER_PREFIX,
    )
}

fn strengthened_directive(forbidden: &[&ToolCall]) -> String {
    let mut text = String::from(
        "\nIMPORTANT: Your previous response was not received. \
         Reply with exactly one protocol line and no other text.\n\
         These calls are FORBIDDEN because they were already made:\n",
    );
    if forbidden.is_empty() {
        text.push_str("- none yet\n");
    }
    for call in forbidden {
        let _ = writeln!(text, "- {}", call_signature(call));
    }
    text
}

fn call_block(prompt: &mut String, heading: &str, steps: &[&StepRecord]) {
    if steps.is_empty() {
        return;
    }
    let _ = write!(prompt, "\n{}\n", heading);
    for call in steps.iter().filter_map(|step| step.tool_call()) {
        let _ = writeln!(prompt, "- {}", call_signature(call));
    }
}

fn call_signature(call: &ToolCall) -> String {
    format!("{}([{}])", call.name, call.params.join(", "))
}

/// One history line per step, keyed by its sequence number
pub fn history_line(record: &StepRecord) -> String {
    let n = record.sequence;
    match (&record.attempt, &record.outcome) {
        (Attempt::Action { action: Action::FinalAnswer { value } }, _) => {
            format!("In iteration {} you gave the final answer {}.", n, value)
        }
        (Attempt::Action { action: Action::ToolCall(call) }, outcome) => {
            let params = call.params.join(", ");
            match outcome {
                Outcome::Success { result } => format!(
                    "In iteration {} you called {} with [{}] and it returned {}. Reasoning type: {}.",
                    n, call.name, params, result, call.reasoning_type
                ),
                Outcome::Skipped { .. } => format!(
                    "In iteration {} you called {} with [{}] again. It was skipped because it was already done.",
                    n, call.name, params
                ),
                Outcome::Failure { kind, reason } => format!(
                    "In iteration {} you called {} with [{}] and it failed ({}): {}.",
                    n, call.name, params, kind, reason
                ),
            }
        }
        (Attempt::Malformed { .. }, outcome) => match outcome {
            Outcome::Failure { kind, reason } => format!(
                "In iteration {} your response was rejected ({}): {}.",
                n, kind, reason
            ),
            _ => format!("In iteration {} your response was rejected.", n),
        },
        (Attempt::ModelCall, outcome) => match outcome.failure_kind() {
            Some(kind) => format!("In iteration {} no response was received ({}).", n, kind),
            None => format!("In iteration {} no response was received.", n),
        },
    }
}
