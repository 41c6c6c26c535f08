use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stepwise_llm::{ModelError, ModelProvider};
use stepwise_memory::{
    Attempt, FailureKind, InMemoryStepLog, LogEntry, Outcome, Preferences, SkipReason,
    StepLogStore, StepMemory,
};
use stepwise_runtime::{Controller, Session, SessionCommand, SessionReply, TerminalState};
use stepwise_tools::builtin::register_finance_tools;
use stepwise_tools::{
    FnTool, ParamKind, ResultKind, ToolError, ToolOutput, ToolRegistry, ToolSignature,
};

/// What the scripted model does on one call
enum Reply {
    Line(String),
    Hang,
    Fail,
}

fn line(text: &str) -> Reply {
    Reply::Line(text.to_string())
}

fn call(function: &str, params: &[&str]) -> Reply {
    let params: Vec<String> = params.iter().map(|p| format!("\"{}\"", p)).collect();
    Reply::Line(format!(
        r#"FUNCTION_CALL: {{"function": "{}", "params": [{}], "reasoning_type": "arithmetic", "self_check": "looks plausible"}}"#,
        function,
        params.join(", ")
    ))
}

/// Model that replays a script, then keeps answering with a fallback
struct ScriptedModel {
    script: Mutex<Vec<Reply>>,
    fallback: Box<dyn Fn(usize) -> Reply + Send + Sync>,
    calls: AtomicUsize,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    fn new(script: Vec<Reply>) -> Self {
        Self::with_fallback(script, |_| line("FINAL_ANSWER: 0"))
    }

    fn with_fallback<F>(mut script: Vec<Reply>, fallback: F) -> Self
    where
        F: Fn(usize) -> Reply + Send + Sync + 'static,
    {
        script.reverse();
        Self {
            script: Mutex::new(script),
            fallback: Box::new(fallback),
            calls: AtomicUsize::new(0),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    async fn generate(&self, prompt: &str) -> stepwise_llm::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| (self.fallback)(n));

        match reply {
            Reply::Line(text) => Ok(text),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("FINAL_ANSWER: 999".to_string())
            }
            Reply::Fail => Err(ModelError::api_error("503 Service Unavailable")),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

type Invocations = Arc<Mutex<HashMap<(String, Vec<String>), usize>>>;

/// Finance toolbox plus tools that count every physical invocation
fn counted_registry() -> (ToolRegistry, Invocations) {
    let invocations: Invocations = Arc::new(Mutex::new(HashMap::new()));

    let counter = Arc::clone(&invocations);
    let add_one = FnTool::new(
        ToolSignature::new("add_one", ResultKind::Number).param("x", ParamKind::Number),
        move |args| {
            let x = args[0].as_f64().unwrap_or_default();
            *counter
                .lock()
                .unwrap()
                .entry(("add_one".to_string(), vec![x.to_string()]))
                .or_default() += 1;
            Ok(ToolOutput::Number(x + 1.0))
        },
    );

    let counter = Arc::clone(&invocations);
    let explode = FnTool::new(
        ToolSignature::new("explode", ResultKind::Number).param("x", ParamKind::Number),
        move |args| {
            let x = args[0].as_f64().unwrap_or_default();
            *counter
                .lock()
                .unwrap()
                .entry(("explode".to_string(), vec![x.to_string()]))
                .or_default() += 1;
            Err(ToolError::execution("division by zero"))
        },
    );

    let mut builder = ToolRegistry::builder();
    builder.register(add_one).unwrap();
    builder.register(explode).unwrap();
    register_finance_tools(&mut builder).unwrap();
    (builder.build(), invocations)
}

fn invocations_of(counts: &Invocations, name: &str, param: &str) -> usize {
    counts
        .lock()
        .unwrap()
        .get(&(name.to_string(), vec![param.to_string()]))
        .copied()
        .unwrap_or(0)
}

fn controller(model: ScriptedModel, tools: ToolRegistry, max_iterations: usize) -> Controller {
    Controller::builder()
        .provider(model)
        .tools(tools)
        .max_iterations(max_iterations)
        .model_timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

const QUERY: &str = "Compound 10000 at 4.5% quarterly for 5 years";

#[tokio::test]
async fn test_immediate_final_answer() {
    let (tools, counts) = counted_registry();
    let controller = controller(ScriptedModel::new(vec![line("FINAL_ANSWER: 12458.32")]), tools, 5);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    assert_eq!(outcome.state, TerminalState::Answered { value: 12458.32 });
    assert_eq!(outcome.iterations, 1);
    assert!(memory.history().iter().all(|r| r.tool_call().is_none()));
    assert!(counts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_repeat_call_is_skipped_without_invoking() {
    let (tools, counts) = counted_registry();
    let model = ScriptedModel::new(vec![
        call("add_one", &["41"]),
        call("add_one", &["41"]),
        line("FINAL_ANSWER: 42"),
    ]);
    let controller = controller(model, tools, 5);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    let history = memory.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].outcome, Outcome::success(ToolOutput::Number(42.0)));
    assert_eq!(
        history[1].outcome,
        Outcome::Skipped {
            reason: SkipReason::Duplicate
        }
    );
    assert_eq!(invocations_of(&counts, "add_one", "41"), 1);
    assert_eq!(outcome.state, TerminalState::Answered { value: 42.0 });
}

#[tokio::test]
async fn test_failed_execution_is_not_retried() {
    let (tools, counts) = counted_registry();
    let model = ScriptedModel::new(vec![
        call("explode", &["1"]),
        call("explode", &["1"]),
        line("FINAL_ANSWER: 0"),
    ]);
    let controller = controller(model, tools, 5);
    let mut memory = StepMemory::new();

    controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    assert_eq!(
        memory.history()[0].outcome.failure_kind(),
        Some(FailureKind::ExecutionError)
    );
    assert_eq!(memory.history()[1].outcome, Outcome::duplicate());
    assert_eq!(invocations_of(&counts, "explode", "1"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_two_timeouts_end_uncertain_with_partial_history() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![call("add_one", &["1"]), Reply::Hang, Reply::Hang]);
    let prompts = model.prompts();
    let controller = controller(model, tools, 10);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    match &outcome.state {
        TerminalState::Uncertain { partial, .. } => assert_eq!(*partial, Some(2.0)),
        other => panic!("expected uncertain, got {:?}", other),
    }
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.steps.len(), 3);
    assert_eq!(memory.history()[1].attempt, Attempt::ModelCall);
    assert_eq!(
        memory.history()[2].outcome.failure_kind(),
        Some(FailureKind::ModelTimeout)
    );
    // The late answers of abandoned calls never land
    assert_eq!(memory.final_answer(), None);

    let prompts = prompts.lock().unwrap();
    assert!(!prompts[1].contains("IMPORTANT"));
    assert!(prompts[2].contains("IMPORTANT"));
    assert!(prompts[2].contains("- add_one([1])"));
}

#[tokio::test(start_paused = true)]
async fn test_single_timeout_is_retried() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![Reply::Hang, line("FINAL_ANSWER: 7")]);
    let controller = controller(model, tools, 10);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    assert_eq!(outcome.state, TerminalState::Answered { value: 7.0 });
    assert_eq!(outcome.iterations, 2);
}

#[tokio::test]
async fn test_model_failures_reset_after_success() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![
        Reply::Fail,
        call("add_one", &["1"]),
        Reply::Fail,
        line("FINAL_ANSWER: 2"),
    ]);
    let controller = controller(model, tools, 10);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    assert_eq!(outcome.state, TerminalState::Answered { value: 2.0 });
    assert_eq!(
        memory.history()[0].outcome.failure_kind(),
        Some(FailureKind::ModelUnavailable)
    );
}

#[tokio::test]
async fn test_malformed_line_is_recorded_and_loop_continues() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![
        line("FUNCTION_CALL: {not valid structure}"),
        line("FINAL_ANSWER: 1"),
    ]);
    let prompts = model.prompts();
    let controller = controller(model, tools, 5);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    let first = &memory.history()[0];
    assert!(matches!(first.attempt, Attempt::Malformed { .. }));
    assert_eq!(first.outcome.failure_kind(), Some(FailureKind::MalformedPayload));
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.state, TerminalState::Answered { value: 1.0 });
    assert!(prompts.lock().unwrap()[1].contains("your response was rejected (malformed payload)"));
}

#[tokio::test]
async fn test_budget_boundary() {
    let (tools, counts) = counted_registry();
    let model = ScriptedModel::with_fallback(vec![], |n| call("add_one", &[n.to_string().as_str()]));
    let controller = controller(model, tools, 4);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    assert_eq!(outcome.iterations, 4);
    assert_eq!(memory.len(), 4);
    assert_eq!(outcome.state, TerminalState::BudgetExhausted { partial: Some(4.0) });
    assert!(!outcome.state.is_confirmed());
    for n in 0..4 {
        assert_eq!(invocations_of(&counts, "add_one", &n.to_string()), 1);
    }
}

#[tokio::test]
async fn test_parse_error_on_last_iteration_exhausts_budget() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![call("add_one", &["1"]), line("I think the answer is 2")]);
    let controller = controller(model, tools, 2);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    assert_eq!(outcome.state, TerminalState::BudgetExhausted { partial: Some(2.0) });
    assert_eq!(
        memory.history()[1].outcome.failure_kind(),
        Some(FailureKind::UnknownPrefix)
    );
}

#[tokio::test]
async fn test_required_steps_complete() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![
        call("calculate_quarterly_rate", &["0.045"]),
        call("calculate_compounding_periods", &["5"]),
    ]);
    let controller = Controller::builder()
        .provider(model)
        .tools(tools)
        .required_tools(["calculate_quarterly_rate", "calculate_compounding_periods"])
        .build()
        .unwrap();
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.state, TerminalState::StepsComplete { result: Some(20.0) });
}

#[tokio::test]
async fn test_final_answer_accepted_before_required_steps() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![line("FINAL_ANSWER: 12507.51")]);
    let controller = Controller::builder()
        .provider(model)
        .tools(tools)
        .required_tools(["calculate_compound_interest"])
        .build()
        .unwrap();
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();
    assert_eq!(outcome.state, TerminalState::Answered { value: 12507.51 });
}

#[tokio::test]
async fn test_tool_errors_are_recovered() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![
        call("calculate_interest", &["1"]),
        call("calculate_bonus", &["10000"]),
        call("calculate_bonus", &["10000", "0.005"]),
        line("FINAL_ANSWER: 50"),
    ]);
    let controller = controller(model, tools, 10);
    let mut memory = StepMemory::new();

    let outcome = controller.solve("s", QUERY, &mut memory, None).await.unwrap();

    let kinds: Vec<_> = memory
        .history()
        .iter()
        .map(|r| r.outcome.failure_kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(FailureKind::ToolNotFound),
            Some(FailureKind::InvalidParams),
            None,
            None
        ]
    );
    assert_eq!(memory.history()[2].outcome, Outcome::success(ToolOutput::Number(50.0)));
    assert_eq!(outcome.state, TerminalState::Answered { value: 50.0 });
}

#[tokio::test]
async fn test_steps_are_persisted() {
    let (tools, _) = counted_registry();
    let store = InMemoryStepLog::new();
    let model = ScriptedModel::new(vec![call("add_one", &["1"]), line("FINAL_ANSWER: 2")]);
    let controller = Controller::builder()
        .provider(model)
        .tools(tools)
        .step_log(store.clone())
        .build()
        .unwrap();
    let mut memory = StepMemory::new();

    controller.solve("abc", QUERY, &mut memory, None).await.unwrap();

    let entries = store.load("abc").await.unwrap();
    assert_eq!(entries.len(), 2);
    let restored = stepwise_memory::replay(&entries).unwrap();
    assert_eq!(restored.history(), memory.history());
}

#[tokio::test]
async fn test_session_reset_keeps_preferences() {
    let (tools, counts) = counted_registry();
    let store = InMemoryStepLog::new();
    let model = ScriptedModel::new(vec![
        call("add_one", &["1"]),
        line("FINAL_ANSWER: 2"),
        call("add_one", &["1"]),
        line("FINAL_ANSWER: 2"),
    ]);
    let prompts = model.prompts();
    let controller = Controller::builder()
        .provider(model)
        .tools(tools)
        .step_log(store.clone())
        .agent_name("stepwise")
        .build()
        .unwrap();

    let prefs = Preferences::new().with("agent_name", "Penny");
    let mut session = Session::new(Arc::new(controller)).with_preferences(prefs);
    assert_eq!(session.agent_name(), "Penny");

    let reply = session
        .handle(SessionCommand::parse(QUERY).unwrap())
        .await
        .unwrap();
    assert!(matches!(reply, SessionReply::Solved(_)));
    assert_eq!(session.memory().len(), 2);

    let reply = session.handle(SessionCommand::Reset).await.unwrap();
    assert!(matches!(reply, SessionReply::Reset));
    assert!(session.memory().is_empty());
    assert_eq!(session.preferences().agent_name(), Some("Penny"));

    // After a reset the same call runs again
    session.solve(QUERY).await.unwrap();
    assert_eq!(invocations_of(&counts, "add_one", "1"), 2);

    let entries = store.load(&session.id().to_string()).await.unwrap();
    assert_eq!(entries.len(), 5);
    assert!(matches!(entries[2], LogEntry::Reset { .. }));

    assert!(prompts.lock().unwrap()[0].contains("- agent name: Penny"));

    let reply = session.handle(SessionCommand::Exit).await.unwrap();
    assert!(matches!(reply, SessionReply::Exit));
}

#[tokio::test]
async fn test_required_steps_are_judged_per_problem() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![
        call("calculate_quarterly_rate", &["0.045"]),
        call("calculate_bonus", &["100", "0.1"]),
        call("calculate_quarterly_rate", &["0.08"]),
    ]);
    let controller = Controller::builder()
        .provider(model)
        .tools(tools)
        .max_iterations(5)
        .required_tools(["calculate_quarterly_rate"])
        .build()
        .unwrap();
    let mut session = Session::new(Arc::new(controller));

    let first = session.solve("Quarterly rate for 4.5% a year").await.unwrap();
    assert_eq!(first.state, TerminalState::StepsComplete { result: Some(0.01125) });
    assert_eq!(first.iterations, 1);

    // The earlier success does not complete the second problem
    let second = session.solve("Quarterly rate for 8% a year").await.unwrap();
    assert_eq!(second.iterations, 2);
    assert_eq!(second.state, TerminalState::StepsComplete { result: Some(0.02) });
    assert_eq!(second.steps.len(), 2);
    assert_eq!(session.memory().len(), 3);
}

#[tokio::test]
async fn test_partial_result_comes_from_current_problem() {
    let (tools, _) = counted_registry();
    let model = ScriptedModel::new(vec![
        call("add_one", &["1"]),
        line("FINAL_ANSWER: 2"),
        line("not a protocol line"),
    ]);
    let controller = controller(model, tools, 1);
    let mut memory = StepMemory::new();

    let first = controller.solve("s", QUERY, &mut memory, None).await.unwrap();
    assert_eq!(first.state, TerminalState::BudgetExhausted { partial: Some(2.0) });

    let second = controller.solve("s", QUERY, &mut memory, None).await.unwrap();
    assert_eq!(second.state, TerminalState::Answered { value: 2.0 });

    let third = controller.solve("s", QUERY, &mut memory, None).await.unwrap();
    assert_eq!(third.state, TerminalState::BudgetExhausted { partial: None });
}
