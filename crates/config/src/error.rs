//! Configuration error types

use std::io;
use thiserror::Error;
use vigil_services::CriteriaError;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Selection rule without any criterion
    #[error("{section}[{index}] should define at least one selection criteria")]
    NoSelectionCriteria {
        /// Criteria section (e.g. "discovery.services")
        section: &'static str,
        /// Rule position within the section
        index: usize,
    },

    /// Criteria value failed to parse (port grammar, glob pattern)
    #[error("{field}: {source}")]
    Criteria {
        /// Field holding the bad value
        field: &'static str,
        /// Underlying criteria error
        #[source]
        source: CriteriaError,
    },

    /// Validation error - invalid value
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Error message
        message: String,
    },

    /// Environment override could not be applied
    #[error("invalid value {value:?} for {var}: {message}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
        /// Error message
        message: String,
    },

    /// Nothing selects any process for instrumentation
    #[error(
        "no services to instrument: define discovery.services, executable_path or open_port, or enable discovery.system_wide"
    )]
    NothingToInstrument,
}

impl ConfigError {
    /// Create a NoSelectionCriteria error
    pub fn no_selection_criteria(section: &'static str, index: usize) -> Self {
        Self::NoSelectionCriteria { section, index }
    }

    /// Create a Criteria error
    pub fn criteria(field: &'static str, source: CriteriaError) -> Self {
        Self::Criteria { field, source }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidEnv error
    pub fn invalid_env(
        var: &'static str,
        value: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::InvalidEnv {
            var,
            value: value.into(),
            message: message.to_string(),
        }
    }
}
