//! Trace printer configuration
//!
//! Debug tap that prints exported spans.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Output mode of the trace printer
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrinterMode {
    /// Not subscribed (default)
    #[default]
    Disabled,
    /// Periodic span count
    Counter,
    /// One human-readable line per span
    Text,
    /// One JSON object per span
    Json,
}

impl PrinterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Counter => "counter",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Whether the printer subscribes at all
    pub fn is_enabled(&self) -> bool {
        *self != Self::Disabled
    }
}

impl FromStr for PrinterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "disabled" => Ok(Self::Disabled),
            "counter" => Ok(Self::Counter),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown printer mode '{other}'")),
        }
    }
}

/// Trace printer configuration
///
/// # Example
///
/// ```toml
/// [printer]
/// mode = "counter"
/// interval = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Output mode
    /// Default: disabled
    pub mode: PrinterMode,

    /// Reporting interval in counter mode
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            mode: PrinterMode::Disabled,
            interval: Duration::from_secs(10),
        }
    }
}
