//! Environment overrides on top of defaults, with no config file present
//!
//! Kept in its own test binary because it mutates process environment.

use stepwise_core::{config::load_config, CoreError};

#[test]
fn test_environment_overrides_without_file() {
    std::env::set_var("STEPWISE__AGENT__MAX_ITERATIONS", "3");
    std::env::set_var(
        "STEPWISE__AGENT__REQUIRED_TOOLS",
        "calculate_quarterly_rate,calculate_compounding_periods",
    );
    std::env::set_var("STEPWISE__MODEL__PROVIDER", "openai");

    let config = load_config("does-not-exist.toml").expect("Failed to load config");
    assert_eq!(config.agent.max_iterations, 3);
    assert_eq!(
        config.agent.required_tools,
        vec!["calculate_quarterly_rate", "calculate_compounding_periods"]
    );
    assert_eq!(config.model.provider, "openai");
    assert_eq!(config.agent.name, "stepwise");

    // Overrides are validated like file values
    std::env::set_var("STEPWISE__AGENT__MAX_ITERATIONS", "0");
    let err = load_config("does-not-exist.toml").unwrap_err();
    assert!(matches!(
        err,
        CoreError::Invalid {
            key: "agent.max_iterations",
            ..
        }
    ));

    std::env::remove_var("STEPWISE__AGENT__MAX_ITERATIONS");
    std::env::remove_var("STEPWISE__AGENT__REQUIRED_TOOLS");
    std::env::remove_var("STEPWISE__MODEL__PROVIDER");
}
