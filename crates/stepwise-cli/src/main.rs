//! Stepwise CLI
//!
//! Reads word problems from stdin, one per line, and solves each with the
//! configured model and the finance toolbox. `reset` clears the step memory
//! and `exit` ends the session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use stepwise_core::{
    config::{load_config, StepwiseConfig},
    logging::{init_logging, LogConfig},
};
use stepwise_llm::create_provider;
use stepwise_memory::{JsonPreferenceStore, JsonlStepLog, MemoryError, PreferenceStore, Preferences};
use stepwise_runtime::{
    prompt::history_line, Controller, ControllerConfig, Session, SessionCommand, SessionOutcome,
    SessionReply, TerminalState,
};
use stepwise_tools::builtin::finance_toolbox;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "stepwise", version, about = "Step-by-step numeric problem solver")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML); optional, defaults apply.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Preference profile to load.
    #[arg(long, default_value = "default")]
    profile: String,

    /// Tool that must succeed before the run may stop on its own.
    /// Repeat the flag for several tools; overrides the configured list.
    #[arg(long = "required", value_name = "TOOL")]
    required: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("invalid configuration ({})", cli.config.display()))?;
    init_logging(LogConfig::from(&config.logging));

    let controller = Arc::new(build_controller(&config, &cli)?);
    let preferences = load_preferences(&config, &cli.profile).await;

    let mut session = Session::new(controller).with_preferences(preferences);
    let agent_name = session.agent_name().to_string();

    println!("Stepwise v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "{} is ready. Type 'exit' to quit, 'reset' to clear the step memory.",
        agent_name
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nYou: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = SessionCommand::parse(&line) else {
            continue;
        };

        match session.handle(command).await {
            Ok(SessionReply::Exit) => break,
            Ok(SessionReply::Reset) => println!("Step memory cleared."),
            Ok(SessionReply::Solved(outcome)) => print_outcome(&agent_name, &outcome),
            Err(e) => println!("Error: {}", e),
        }
    }

    Ok(())
}

fn build_controller(config: &StepwiseConfig, cli: &Cli) -> Result<Controller> {
    let api_key = std::env::var(&config.model.api_key_env)
        .with_context(|| format!("{} is not set", config.model.api_key_env))?;
    let provider = create_provider(&config.model.provider, &api_key, &config.model.model)?;

    let tools = finance_toolbox()?
        .timeout(config.agent.tool_timeout())
        .build();

    let mut controller_config = ControllerConfig::from(&config.agent);
    if !cli.required.is_empty() {
        controller_config.required_tools = cli.required.iter().cloned().collect();
    }

    let controller = Controller::builder()
        .shared_provider(provider.into())
        .tools(tools)
        .step_log(JsonlStepLog::new(&config.agent.session_dir))
        .config(controller_config)
        .build()?;

    tracing::info!(
        "Using {} model {} with {} tools",
        config.model.provider,
        config.model.model,
        controller.tools().count()
    );
    Ok(controller)
}

async fn load_preferences(config: &StepwiseConfig, profile: &str) -> Preferences {
    let store = JsonPreferenceStore::new(&config.agent.preferences_path);
    match store.load(profile).await {
        Ok(preferences) => preferences,
        Err(MemoryError::NotFound(_)) => {
            tracing::debug!("No saved preferences for profile {}", profile);
            Preferences::new()
        }
        Err(e) => {
            tracing::warn!("Failed to load preferences for {}: {}", profile, e);
            Preferences::new()
        }
    }
}

fn print_outcome(agent_name: &str, outcome: &SessionOutcome) {
    println!();
    for step in &outcome.steps {
        println!("  {}", history_line(step));
    }
    println!(
        "\n{}: {} ({} iteration(s))",
        agent_name,
        describe(&outcome.state),
        outcome.iterations
    );
}

fn describe(state: &TerminalState) -> String {
    let partial = |value: Option<f64>| match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    };

    match state {
        TerminalState::Answered { value } => format!("Final answer: {}", value),
        TerminalState::StepsComplete { result } => {
            format!("All required steps done. Result: {}", partial(*result))
        }
        TerminalState::BudgetExhausted { partial: p } => format!(
            "Ran out of iterations. Unconfirmed partial result: {}",
            partial(*p)
        ),
        TerminalState::Uncertain { partial: p, reason } => format!(
            "The model stopped responding ({}). Unconfirmed partial result: {}",
            reason,
            partial(*p)
        ),
    }
}
