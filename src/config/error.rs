//! Configuration Error Types
//!
//! Error handling for configuration loading and validation, with specific,
//! actionable messages for each failure scenario.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Base configuration file not found at the expected location
    #[error("Configuration file not found. Searched paths: {searched_paths:?}")]
    ConfigFileNotFound { searched_paths: Vec<PathBuf> },

    /// Source could not be read or parsed
    #[error("Parse error for file {file_path}: {reason}")]
    ParseError { file_path: String, reason: String },

    /// Parsed values do not match the expected structure
    #[error("Failed to deserialize configuration: {error}")]
    DeserializationError { error: String },

    /// Missing required configuration field
    #[error("Missing required configuration field '{field}' in {context}")]
    MissingRequiredField { field: String, context: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    /// Configuration validation errors
    #[error("Configuration validation failed: {error}")]
    ValidationError { error: String },
}

impl ConfigurationError {
    /// Create a configuration file not found error
    pub fn config_file_not_found(searched_paths: Vec<PathBuf>) -> Self {
        Self::ConfigFileNotFound { searched_paths }
    }

    /// Create a parse error for a specific file
    pub fn parse_error<P: Into<String>, E: std::fmt::Display>(file_path: P, error: E) -> Self {
        Self::ParseError {
            file_path: file_path.into(),
            reason: error.to_string(),
        }
    }

    /// Create a deserialization error
    pub fn deserialization_error<E: std::fmt::Display>(error: E) -> Self {
        Self::DeserializationError {
            error: error.to_string(),
        }
    }

    /// Create a missing required field error
    pub fn missing_required_field<F: Into<String>, C: Into<String>>(field: F, context: C) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
            context: context.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value<F: Into<String>, V: Into<String>, C: Into<String>>(
        field: F,
        value: V,
        context: C,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }

    /// Create a validation error
    pub fn validation_error<E: std::fmt::Display>(error: E) -> Self {
        Self::ValidationError {
            error: error.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigurationError>;
