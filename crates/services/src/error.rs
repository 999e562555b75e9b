//! Criteria error types
//!
//! All of these are configuration-time errors. Matching itself never fails.

use thiserror::Error;

/// Result type for criteria operations
pub type Result<T> = std::result::Result<T, CriteriaError>;

/// Errors raised while building or validating selection criteria
#[derive(Debug, Error)]
pub enum CriteriaError {
    /// Port enumeration text does not follow the `N[-M][,N[-M]...]` grammar
    #[error(
        "invalid port range {value:?}. Must be a comma-separated list of numeric ports or port ranges (e.g. 8000-8999)"
    )]
    InvalidPortRange {
        /// The rejected text
        value: String,
    },

    /// A port number does not fit in 16 bits
    #[error("port {port} in {value:?} is out of range (0-65535)")]
    PortOutOfRange {
        /// The offending number as written
        port: String,
        /// The full enumeration text
        value: String,
    },

    /// A range ends before it starts
    #[error("port range {start}-{end} in {value:?} ends before it starts")]
    InvertedPortRange {
        /// Range start
        start: u16,
        /// Range end
        end: u16,
        /// The full enumeration text
        value: String,
    },

    /// Glob pattern failed to compile
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        /// The rejected pattern
        pattern: String,
        /// Compilation error
        #[source]
        source: globset::Error,
    },

    /// Rule defines no discriminating criterion
    #[error("rule {index} should define at least one selection criteria")]
    NoSelectionCriteria {
        /// Position of the rule in its criteria set
        index: usize,
    },

    /// Rule failed to deserialize (unknown metadata key, bad value)
    #[error("rule {index}: {message}")]
    InvalidRule {
        /// Position of the rule in its criteria set
        index: usize,
        /// Underlying deserialization message
        message: String,
    },
}

impl CriteriaError {
    /// Create an InvalidPortRange error
    pub fn invalid_port_range(value: impl Into<String>) -> Self {
        Self::InvalidPortRange {
            value: value.into(),
        }
    }

    /// Create a NoSelectionCriteria error
    #[inline]
    pub fn no_selection_criteria(index: usize) -> Self {
        Self::NoSelectionCriteria { index }
    }

    /// Create an InvalidRule error
    pub fn invalid_rule(index: usize, message: impl ToString) -> Self {
        Self::InvalidRule {
            index,
            message: message.to_string(),
        }
    }

    /// Index of the offending rule, for errors tied to a rule
    pub fn rule_index(&self) -> Option<usize> {
        match self {
            Self::NoSelectionCriteria { index } | Self::InvalidRule { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }
}
