//! Circuit breakers built from TOML configuration

use crate::config::CircuitBreakerConfig;
use crate::resilience::{CircuitBreakerManager, CircuitState};
use ::config::{Config, File, FileFormat};
use std::time::Duration;

const BREAKERS_TOML: &str = r#"
enabled = true
max_circuit_breakers = 10

[default_config]
failure_threshold = 4
success_threshold = 2
open_timeout_seconds = 30

[component_configs.berth_allocator]
failure_threshold = 1
success_threshold = 1
open_timeout_seconds = 5
"#;

fn parse(contents: &str) -> CircuitBreakerConfig {
    Config::builder()
        .add_source(File::from_str(contents, FileFormat::Toml))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

#[test]
fn test_toml_based_circuit_breaker_configuration() {
    let config = parse(BREAKERS_TOML);
    let manager = CircuitBreakerManager::from_config(&config);

    let berths = manager.get_circuit_breaker("berth_allocator");
    assert_eq!(berths.settings().failure_threshold, 1);
    assert_eq!(berths.settings().open_timeout, Duration::from_secs(5));

    let grid = manager.get_circuit_breaker("grid_command");
    assert_eq!(grid.settings().failure_threshold, 4);
    assert_eq!(grid.settings().open_timeout, Duration::from_secs(30));

    berths.record_failure();
    berths.record_failure();
    assert_eq!(berths.state(), CircuitState::Open);
    assert_eq!(grid.state(), CircuitState::Closed);
}

#[test]
fn test_partial_toml_falls_back_to_defaults() {
    let config = parse("enabled = false\n");
    assert!(!config.enabled);
    assert_eq!(config.default_config, Default::default());
    assert!(config.component_configs.is_empty());
}
