//! Pipeline error types

use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The topic is closed; the caller should wind down
    #[error("topic '{topic}' is closed")]
    TopicClosed { topic: String },
}

impl PipelineError {
    pub fn topic_closed(topic: impl Into<String>) -> Self {
        Self::TopicClosed {
            topic: topic.into(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
