//! Global configuration settings
//!
//! These settings apply across all pipeline stages.

use serde::Deserialize;

/// Default per-subscriber topic capacity
pub const DEFAULT_CHANNEL_BUFFER_LEN: usize = 10;

/// Global configuration that applies to all components
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Capacity of each subscriber queue on every pipeline topic
    /// Default: 10
    pub channel_buffer_len: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            channel_buffer_len: DEFAULT_CHANNEL_BUFFER_LEN,
        }
    }
}
