//! Vigil Configuration
//!
//! TOML-based configuration loading with sensible defaults, environment
//! overrides and validation. Only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse and validate configuration:
//!
//! ```
//! use vigil_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("open_port = \"8080\"").unwrap();
//! assert_eq!(config.effective_services().unwrap().len(), 1);
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [[discovery.services]]
//! exe_path = "*myapp*"
//!
//! [routes]
//! patterns = ["/user/:id"]
//! unmatch = "heuristic"
//! ```
//!
//! # Loading order
//!
//! File (or defaults) → environment overrides → validation.

mod discovery;
mod env;
mod error;
mod filter;
mod global;
mod logging;
mod printer;
mod routes;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use discovery::DiscoveryConfig;
pub use env::{
    ENV_BPF_PID_FILTER_OFF, ENV_CHANNEL_BUFFER_LEN, ENV_DISCOVERY_POLL_INTERVAL,
    ENV_EXCLUDE_OTEL_INSTRUMENTED_SERVICES, ENV_EXECUTABLE_PATH, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    ENV_OPEN_PORT, ENV_ROUTES_UNMATCH, ENV_ROUTES_WILDCARD_CHAR, ENV_SKIP_GO_SPECIFIC_TRACERS,
    ENV_SYSTEM_WIDE, ENV_TRACE_PRINTER, process_env,
};
pub use error::{ConfigError, Result};
pub use filter::{FilterConfig, KNOWN_FILTER_ATTRIBUTES, MatchDefinition, is_known_filter_attribute};
pub use global::{DEFAULT_CHANNEL_BUFFER_LEN, GlobalConfig};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use printer::{PrinterConfig, PrinterMode};
pub use routes::{DEFAULT_HEURISTIC_CACHE_SIZE, RoutesConfig, UnmatchPolicy};
pub use validation::ConfigWarning;

use serde::Deserialize;
use vigil_services::{
    Attributes, DefinitionCriteria, GlobAttr, PortEnum, ServiceSelector, default_exclude_services,
};

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob on the executable path, appended as the last services rule
    pub executable_path: Option<String>,

    /// Port enumeration, appended as the last services rule
    pub open_port: Option<String>,

    /// Global settings (topic capacity)
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Which processes to instrument
    pub discovery: DiscoveryConfig,

    /// Route classification; absent means routes are left untouched
    pub routes: Option<RoutesConfig>,

    /// Span attribute filters
    pub filter: FilterConfig,

    /// Debug trace printer
    pub printer: PrinterConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = read_file(path.as_ref())?;
        Self::from_str(&contents)
    }

    /// File (or defaults when `path` is `None`) plus environment
    /// overrides, without validation
    pub fn read<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::parse_toml(&read_file(path)?)?,
            None => Self::default(),
        };
        config.apply_env_overrides(lookup)?;
        Ok(config)
    }

    /// File plus environment overrides, validated
    pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::read(path, lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML without validating
    pub fn parse_toml(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(ConfigError::ParseError)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Non-fatal problems to report at startup
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        validation::collect_warnings(self)
    }

    /// `discovery.services` plus the rule built from `executable_path` and
    /// `open_port`, which has the lowest precedence
    pub fn effective_services(&self) -> Result<DefinitionCriteria> {
        let mut services = self.discovery.services.clone();

        let exe = self.executable_path.as_deref().filter(|s| !s.is_empty());
        let port = self.open_port.as_deref().filter(|s| !s.is_empty());
        if exe.is_none() && port.is_none() {
            return Ok(services);
        }

        let mut rule = Attributes::default();
        if let Some(exe) = exe {
            let glob = GlobAttr::new(exe).map_err(|e| ConfigError::criteria("executable_path", e))?;
            rule = rule.with_exe_path(glob);
        }
        if let Some(port) = port {
            let ports: PortEnum = port
                .parse()
                .map_err(|e| ConfigError::criteria("open_port", e))?;
            rule = rule.with_open_ports(ports);
        }
        services.push(rule);
        Ok(services)
    }

    /// Composite eligibility for discovered processes
    pub fn selector(&self) -> Result<ServiceSelector> {
        let default_exclude = match self.discovery.default_exclude_services {
            Some(ref custom) => custom.clone(),
            None => default_exclude_services()
                .map_err(|e| ConfigError::criteria("default_exclude_services", e))?,
        };
        Ok(ServiceSelector::new(
            self.effective_services()?,
            self.discovery.exclude_services.clone(),
            default_exclude,
        )
        .with_system_wide(self.discovery.system_wide))
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config = Self::parse_toml(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use vigil_services::CandidateAttrs;

    #[test]
    fn test_minimal_config() {
        let toml = r#"
[[discovery.services]]
exe_path = "*myapp*"
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.discovery.services.len(), 1);
        assert_eq!(config.global.channel_buffer_len, DEFAULT_CHANNEL_BUFFER_LEN);
        assert!(config.routes.is_none());
        assert!(config.filter.is_empty());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
executable_path = "*myapp*"
open_port = "8080-8089"

[global]
channel_buffer_len = 20

[log]
level = "debug"
format = "json"

[discovery]
poll_interval = "1s"
exclude_otel_instrumented_services = true

[[discovery.services]]
name = "checkout"
namespace = "shop"
open_ports = "8080,8443,9000-9100"
exe_path = "*java*"
k8s_namespace = "prod*"
k8s_pod_labels = { app = "checkout*" }

[[discovery.exclude_services]]
exe_path = "*sidecar*"

[routes]
patterns = ["/user/:id", "/users/{id}/product/{pid}"]
unmatch = "heuristic"
wildcard_char = "*"

[filter.application]
"url.path" = { not_match = "/health*" }

[printer]
mode = "text"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.global.channel_buffer_len, 20);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.discovery.services.len(), 1);
        assert_eq!(config.discovery.exclude_services.len(), 1);
        assert_eq!(
            config.routes.as_ref().unwrap().unmatch_policy(),
            UnmatchPolicy::Heuristic
        );
        assert_eq!(config.filter.application.len(), 1);
        assert_eq!(config.printer.mode, PrinterMode::Text);
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_convenience_rule_is_appended_last() {
        let toml = r#"
executable_path = "*myapp*"
open_port = "8080-8089"

[[discovery.services]]
name = "first"
exe_path = "*"
"#;
        let config = Config::from_str(toml).unwrap();
        let services = config.effective_services().unwrap();
        assert_eq!(services.len(), 2);

        let last = &services.rules()[1];
        assert_eq!(last.exe_path.pattern(), "*myapp*");
        assert!(last.open_ports.matches(8085));
        assert_eq!(services.rules()[0].name, "first");
    }

    #[test]
    fn test_selector_applies_default_exclude() {
        let config = Config::from_str(r#"executable_path = "*""#).unwrap();
        let selector = config.selector().unwrap();
        assert!(selector.select(&CandidateAttrs::new("/usr/bin/nginx")).is_some());
        assert!(selector.select(&CandidateAttrs::new("/usr/local/bin/vigil")).is_none());
    }

    #[test]
    fn test_selector_with_empty_default_exclude() {
        let toml = r#"
executable_path = "*"

[discovery]
default_exclude_services = []
"#;
        let config = Config::from_str(toml).unwrap();
        let selector = config.selector().unwrap();
        assert!(selector.select(&CandidateAttrs::new("/usr/local/bin/vigil")).is_some());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "open_port = \"443\"").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.open_port.as_deref(), Some("443"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/vigil.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(err.to_string().contains("/nonexistent/vigil.toml"));
    }

    #[test]
    fn test_load_applies_env_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.toml");
        std::fs::write(&path, "[log]\nlevel = \"warn\"\n").unwrap();

        // invalid on its own: nothing to instrument
        assert!(Config::from_file(&path).is_err());

        let config = Config::load(Some(&path), |key| {
            (key == ENV_OPEN_PORT).then(|| "8080".to_string())
        })
        .unwrap();
        assert_eq!(config.log.level, LogLevel::Warn);
        assert_eq!(config.open_port.as_deref(), Some("8080"));
    }

    #[test]
    fn test_read_without_file_uses_defaults() {
        let config = Config::read(None, |_| None).unwrap();
        assert!(config.validate().is_err());
        assert_eq!(config.printer.mode, PrinterMode::Disabled);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
