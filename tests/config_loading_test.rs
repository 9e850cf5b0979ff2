use dispatch_core::config::{ConfigManager, ConfigurationError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn repo_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn test_shipped_base_configuration_is_valid() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(repo_config_dir()), "development")
            .unwrap();
    let config = manager.config();

    assert_eq!(config.admission.hard_limit, 1000);
    assert!(config.rate_limit.enabled);
    assert_eq!(
        config
            .circuit_breakers
            .config_for_component("dispatch")
            .failure_threshold,
        3
    );
    assert_eq!(
        config
            .circuit_breakers
            .config_for_component("berth_allocator")
            .failure_threshold,
        5
    );
}

#[test]
fn test_shipped_test_overlay_applies() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(repo_config_dir()), "test").unwrap();
    let config = manager.config();

    assert_eq!(config.admission.hard_limit, 10);
    assert!(!config.rate_limit.enabled);
    assert_eq!(config.checkpoint.interval, 5);
    // untouched by the overlay
    assert_eq!(config.policy.sensitivity, 3);
    assert_eq!(config.circuit_breakers.default_config.open_timeout_seconds, 1);
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dispatch-core.toml"), "[admission\nhard_limit = ").unwrap();

    let err = ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::ParseError { .. }));
}

#[test]
fn test_breaker_override_must_be_valid() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("dispatch-core.toml"),
        "[circuit_breakers.component_configs.intake]\nfailure_threshold = 0\n",
    )
    .unwrap();

    let err = ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
        .unwrap_err();
    assert!(err.to_string().contains("component_configs.intake"));
}

#[test]
fn test_debug_config_is_serializable_json() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(repo_config_dir()), "test").unwrap();
    let json = manager.debug_config();

    assert_eq!(json["admission"]["hard_limit"], 10);
    assert_eq!(json["routing"]["transit_speed"], 12.0);
}
