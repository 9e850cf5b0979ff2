//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered in order:
//!
//! 1. `dispatch-core.toml` in the configuration directory (required)
//! 2. `dispatch-core.{environment}.toml` (optional overlay)
//! 3. `DISPATCH_CORE__SECTION__KEY` environment variables
//!
//! The merged result is validated before it is handed out.

use super::error::{ConfigResult, ConfigurationError};
use super::CoreConfig;
use crate::constants::env as env_vars;
use ::config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const BASE_FILE_STEM: &str = "dispatch-core";

/// Loaded configuration plus the context it was loaded from
#[derive(Debug)]
pub struct ConfigManager {
    config: CoreConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Useful for tests that must not touch process-wide environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_sources(config_dir, environment, None)
    }

    /// Like [`ConfigManager::load`], but falls back to defaults when the base
    /// file does not exist. Parse and validation errors are still returned.
    pub fn load_or_default() -> ConfigResult<Arc<ConfigManager>> {
        match Self::load() {
            Err(ConfigurationError::ConfigFileNotFound { searched_paths }) => {
                warn!(
                    searched = ?searched_paths,
                    "No configuration file found, using built-in defaults"
                );
                Ok(Arc::new(Self::from_config(
                    CoreConfig::default(),
                    &Self::detect_environment(),
                )))
            }
            other => other,
        }
    }

    /// Wrap an already-built configuration (tests, embedding callers)
    pub fn from_config(config: CoreConfig, environment: &str) -> ConfigManager {
        ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }
    }

    /// Shared loading path. `env_overrides` replaces the process environment
    /// as the variable source when present.
    pub(crate) fn load_with_sources(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);
        let base_path = config_directory.join(format!("{BASE_FILE_STEM}.toml"));
        let overlay_path = config_directory.join(format!("{BASE_FILE_STEM}.{environment}.toml"));

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        if !base_path.is_file() {
            return Err(ConfigurationError::config_file_not_found(vec![base_path]));
        }

        let mut environment_source = Environment::with_prefix(env_vars::CONFIG_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        if env_overrides.is_some() {
            environment_source = environment_source.source(env_overrides);
        }

        let merged = Config::builder()
            .add_source(File::from(base_path.as_path()).format(FileFormat::Toml))
            .add_source(
                File::from(overlay_path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment_source)
            .build()
            .map_err(|e| ConfigurationError::parse_error(base_path.display().to_string(), e))?;

        let config: CoreConfig = merged
            .try_deserialize()
            .map_err(ConfigurationError::deserialization_error)?;

        config.validate()?;

        info!(
            environment = %environment,
            overlay = overlay_path.is_file(),
            hard_limit = config.admission.hard_limit,
            failure_threshold = config.circuit_breakers.default_config.failure_threshold,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the configuration directory
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Sanitized JSON view of the configuration for logs and the validator CLI
    pub fn debug_config(&self) -> serde_json::Value {
        let mut config_json = serde_json::json!(self.config);
        let sensitive_patterns = ["password", "secret", "key", "token", "credential"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive && !val.is_object() {
                        *val = serde_json::Value::String("[MASKED]".to_string());
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }

    /// Detect current environment: DISPATCH_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var(env_vars::ENVIRONMENT)
            .or_else(|_| env::var(env_vars::FALLBACK_ENVIRONMENT))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// DISPATCH_CONFIG_DIR when set, otherwise `./config`
    fn default_config_directory() -> PathBuf {
        env::var(env_vars::CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}
