//! # Structured Logging Module
//!
//! Environment-aware console logging on top of `tracing`. The core never
//! writes logs itself outside of `tracing` events; embedding processes either
//! call [`init_structured_logging`] or install their own subscriber.
//!
//! Level selection: `RUST_LOG` wins when set, otherwise the environment
//! (`DISPATCH_ENV`, then `APP_ENV`) maps to a default level. Set
//! `DISPATCH_LOG_FORMAT=json` for JSON lines.

use crate::constants::env as env_vars;
use chrono::Utc;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var(env_vars::LOG_FORMAT)
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let console_layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(std::io::stdout().is_terminal())
                .with_filter(filter)
                .boxed()
        };

        // try_init: an embedding process may already own the global subscriber
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env_vars::ENVIRONMENT)
        .or_else(|_| std::env::var(env_vars::FALLBACK_ENVIRONMENT))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for dispatch operations
pub fn log_dispatch_operation(
    operation: &str,
    admitted: usize,
    rejected: usize,
    capacity: usize,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        admitted = admitted,
        rejected = rejected,
        capacity = capacity,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "DISPATCH_OPERATION"
    );
}

/// Log structured data for registry operations
pub fn log_registry_operation(
    operation: &str,
    service: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        service = service,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "REGISTRY_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
