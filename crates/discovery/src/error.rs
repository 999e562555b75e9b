//! Discovery error types

use thiserror::Error;

/// Discovery errors
///
/// None of these stop discovery; they are logged and the affected process
/// is reported without ports.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The listening socket table could not be read
    #[error("failed to read socket table: {0}")]
    SocketTable(String),

    /// The sockets of one process could not be read
    #[error("failed to read sockets of pid {pid}: {message}")]
    Sockets { pid: u32, message: String },
}

impl DiscoveryError {
    pub fn socket_table(err: impl ToString) -> Self {
        Self::SocketTable(err.to_string())
    }

    pub fn sockets(pid: u32, err: impl ToString) -> Self {
        Self::Sockets {
            pid,
            message: err.to_string(),
        }
    }
}

/// Result type for discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;
