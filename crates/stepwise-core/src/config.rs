//! Configuration management for the solver
//!
//! Configuration is layered:
//! - Default values
//! - Configuration files (TOML, JSON, YAML)
//! - Environment variables (`STEPWISE__AGENT__MAX_ITERATIONS=20`)

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "STEPWISE";

/// Main configuration for the solver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepwiseConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Decision loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Model provider settings
    #[serde(default)]
    pub model: ModelSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,
}

/// Decision loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Agent name, shown in prompts and console output
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Iteration budget for one problem
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Wall-clock limit for a single model call, in seconds
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Wall-clock limit for a single tool call, in seconds
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Tools that must all succeed before the loop may stop on its own.
    /// Empty disables the completeness check.
    #[serde(default)]
    pub required_tools: Vec<String>,

    /// Directory holding the append-only step logs
    #[serde(default = "default_session_dir")]
    pub session_dir: PathBuf,

    /// Preference document
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,
}

/// Model provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Provider name: gemini, openai
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_agent_name() -> String {
    "stepwise".to_string()
}

fn default_max_iterations() -> usize {
    10
}

fn default_model_timeout_secs() -> u64 {
    10
}

fn default_tool_timeout_secs() -> u64 {
    5
}

fn default_session_dir() -> PathBuf {
    PathBuf::from("sessions")
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("user_preferences.json")
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            max_iterations: default_max_iterations(),
            model_timeout_secs: default_model_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            required_tools: Vec::new(),
            session_dir: default_session_dir(),
            preferences_path: default_preferences_path(),
        }
    }
}

impl AgentSettings {
    /// Model call timeout as a [`Duration`]
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// Tool call timeout as a [`Duration`]
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl StepwiseConfig {
    /// Reject settings the decision loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            return Err(CoreError::invalid("agent.max_iterations", "must be at least 1"));
        }
        if self.agent.model_timeout_secs == 0 {
            return Err(CoreError::invalid("agent.model_timeout_secs", "must be at least 1"));
        }
        if self.agent.tool_timeout_secs == 0 {
            return Err(CoreError::invalid("agent.tool_timeout_secs", "must be at least 1"));
        }
        if self.model.provider.trim().is_empty() {
            return Err(CoreError::invalid("model.provider", "must not be empty"));
        }
        Ok(())
    }
}

/// Load configuration from defaults, a file, and the environment
///
/// The file is optional; its format follows the extension (TOML, JSON or
/// YAML). Variables such as `STEPWISE__AGENT__MAX_ITERATIONS=20` override
/// both, and `STEPWISE__AGENT__REQUIRED_TOOLS` takes a comma-separated list.
/// The merged result is validated.
///
/// # Example
///
/// ```no_run
/// use stepwise_core::config::load_config;
///
/// let config = load_config("stepwise.toml").unwrap();
/// println!("Budget: {}", config.agent.max_iterations);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StepwiseConfig> {
    let path = path.as_ref();

    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("agent.required_tools")
                .try_parsing(true),
        )
        .build()?;

    let config: StepwiseConfig = settings.try_deserialize()?;
    config.validate()?;

    if path.exists() {
        tracing::info!("Configuration loaded from {}", path.display());
    } else {
        tracing::info!(
            "No config file at {}, using defaults and environment",
            path.display()
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StepwiseConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.agent.name, "stepwise");
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.model_timeout(), Duration::from_secs(10));
        assert!(config.agent.required_tools.is_empty());
        assert_eq!(config.model.provider, "gemini");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json_with_missing_sections() {
        let json = r#"{
            "agent": {
                "max_iterations": 20,
                "required_tools": ["calculate_compound_interest"]
            }
        }"#;

        let config: StepwiseConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.agent.max_iterations, 20);
        assert_eq!(config.agent.required_tools, vec!["calculate_compound_interest"]);
        assert_eq!(config.agent.tool_timeout_secs, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.model.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = StepwiseConfig::default();
        config.agent.max_iterations = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_iterations"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = StepwiseConfig::default();
        config.agent.model_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[agent]\nmax_iterations = 7\nmodel_timeout_secs = 3\n\n[model]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\napi_key_env = \"OPENAI_API_KEY\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.agent.max_iterations, 7);
        assert_eq!(config.agent.model_timeout_secs, 3);
        assert_eq!(config.model.provider, "openai");
    }

    #[test]
    fn test_load_invalid_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[agent]\nmax_iterations = 0").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config("nonexistent.toml").unwrap();
        assert_eq!(config.agent.name, "stepwise");
        assert_eq!(config.agent.max_iterations, 10);
    }

    #[test]
    fn test_unparseable_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[agent\nmax_iterations = ").unwrap();
        assert!(matches!(load_config(file.path()), Err(CoreError::Load(_))));
    }
}
