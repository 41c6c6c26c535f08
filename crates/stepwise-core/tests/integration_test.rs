//! Configuration, error and logging pieces working together

use stepwise_core::{
    config::{load_config, StepwiseConfig},
    error::{CoreError, Result},
    logging::LogConfig,
};

#[test]
fn test_config_loading_without_file_uses_defaults() {
    let config = load_config("nonexistent.toml").expect("defaults are valid");
    assert_eq!(config.agent.name, "stepwise");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_config_serialization_roundtrip() {
    let config = StepwiseConfig::default();

    let json = serde_json::to_string(&config).expect("Failed to serialize");
    let deserialized: StepwiseConfig = serde_json::from_str(&json).expect("Failed to deserialize");

    assert_eq!(config.agent.max_iterations, deserialized.agent.max_iterations);
    assert_eq!(config.agent.session_dir, deserialized.agent.session_dir);
    assert_eq!(config.model.model, deserialized.model.model);
}

#[test]
fn test_error_handling() {
    let result: Result<()> = Err(CoreError::invalid("agent.name", "test error"));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("agent.name"));
    assert!(err.to_string().contains("test error"));
}

#[test]
fn test_logging_config_follows_file_section() {
    let json = r#"{ "logging": { "level": "debug", "json": true } }"#;
    let config: StepwiseConfig = serde_json::from_str(json).expect("Failed to parse JSON");

    let log_config = LogConfig::from(&config.logging);
    assert_eq!(log_config.level, "debug");
    assert!(log_config.json);
}
