//! Discovery configuration
//!
//! Which processes get instrumented, and how often the process table is
//! inspected.
//!
//! # Example
//!
//! ```toml
//! [discovery]
//! poll_interval = "5s"
//!
//! [[discovery.services]]
//! name = "checkout"
//! open_ports = "8080-8089"
//! exe_path = "*java*"
//!
//! [[discovery.exclude_services]]
//! exe_path = "*sidecar*"
//! ```

use std::time::Duration;

use serde::Deserialize;
use vigil_services::DefinitionCriteria;

/// Process discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Services to instrument, earlier rules take precedence
    pub services: DefinitionCriteria,

    /// Services never instrumented, even if matched by `services`
    pub exclude_services: DefinitionCriteria,

    /// Replaces the built-in exclusion of the agent and known collectors.
    /// `None` keeps the built-in set; an empty list disables it.
    pub default_exclude_services: Option<DefinitionCriteria>,

    /// Interval between two inspections of the process table
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Instrument every process that is not excluded
    pub system_wide: bool,

    /// Use generic tracers only for Go binaries
    pub skip_go_specific_tracers: bool,

    /// Filter PIDs in user space only
    pub bpf_pid_filter_off: bool,

    /// Skip services that already export their own telemetry
    pub exclude_otel_instrumented_services: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            services: DefinitionCriteria::default(),
            exclude_services: DefinitionCriteria::default(),
            default_exclude_services: None,
            poll_interval: Duration::from_secs(5),
            system_wide: false,
            skip_go_specific_tracers: false,
            bpf_pid_filter_off: false,
            exclude_otel_instrumented_services: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DiscoveryConfig::default();
        assert!(config.services.is_empty());
        assert!(config.default_exclude_services.is_none());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(!config.system_wide);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
poll_interval = "500ms"
system_wide = true
skip_go_specific_tracers = true
bpf_pid_filter_off = true
exclude_otel_instrumented_services = true
default_exclude_services = []

[[services]]
name = "api"
open_ports = 443

[[exclude_services]]
exe_path = "*sidecar*"
"#;
        let config: DiscoveryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert!(config.system_wide);
        assert!(config.skip_go_specific_tracers);
        assert!(config.bpf_pid_filter_off);
        assert!(config.exclude_otel_instrumented_services);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.exclude_services.len(), 1);
        assert!(config.default_exclude_services.unwrap().is_empty());
    }

    #[test]
    fn test_poll_interval_variants() {
        for (s, expected) in [
            ("100ms", Duration::from_millis(100)),
            ("1s", Duration::from_secs(1)),
            ("1m", Duration::from_secs(60)),
        ] {
            let toml = format!("poll_interval = \"{}\"", s);
            let config: DiscoveryConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config.poll_interval, expected, "Failed for {}", s);
        }
    }
}
