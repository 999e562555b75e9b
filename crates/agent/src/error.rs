//! Agent error types

use thiserror::Error;
use vigil_config::ConfigError;
use vigil_transform::TransformError;

/// Errors building or running the agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration could not be turned into components
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A transformer could not be built
    #[error("transform setup failed: {0}")]
    Transform(#[from] TransformError),

    /// A stage task panicked
    #[error("task '{task}' failed: {message}")]
    Task { task: &'static str, message: String },
}

impl AgentError {
    pub fn task(task: &'static str, err: impl ToString) -> Self {
        Self::Task {
            task,
            message: err.to_string(),
        }
    }
}

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
