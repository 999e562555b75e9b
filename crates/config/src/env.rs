//! Environment overrides
//!
//! Applied after the file is parsed and before validation. Empty values
//! are ignored.

use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::routes::RoutesConfig;
use crate::Config;

pub const ENV_LOG_LEVEL: &str = "VIGIL_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "VIGIL_LOG_FORMAT";
pub const ENV_CHANNEL_BUFFER_LEN: &str = "VIGIL_CHANNEL_BUFFER_LEN";
pub const ENV_EXECUTABLE_PATH: &str = "VIGIL_EXECUTABLE_PATH";
pub const ENV_OPEN_PORT: &str = "VIGIL_OPEN_PORT";
pub const ENV_DISCOVERY_POLL_INTERVAL: &str = "VIGIL_DISCOVERY_POLL_INTERVAL";
pub const ENV_SYSTEM_WIDE: &str = "VIGIL_SYSTEM_WIDE";
pub const ENV_SKIP_GO_SPECIFIC_TRACERS: &str = "VIGIL_SKIP_GO_SPECIFIC_TRACERS";
pub const ENV_BPF_PID_FILTER_OFF: &str = "VIGIL_BPF_PID_FILTER_OFF";
pub const ENV_EXCLUDE_OTEL_INSTRUMENTED_SERVICES: &str = "VIGIL_EXCLUDE_OTEL_INSTRUMENTED_SERVICES";
pub const ENV_ROUTES_UNMATCH: &str = "VIGIL_ROUTES_UNMATCH";
pub const ENV_ROUTES_WILDCARD_CHAR: &str = "VIGIL_ROUTES_WILDCARD_CHAR";
pub const ENV_TRACE_PRINTER: &str = "VIGIL_TRACE_PRINTER";

/// Reads a variable from the process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::invalid_env(var, value, "expected true or false")),
    }
}

fn parse_duration(var: &'static str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::invalid_env(var, value, e))
}

fn parse_usize(var: &'static str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid_env(var, value, e))
}

impl Config {
    /// Overlay environment variables onto the configuration
    ///
    /// `lookup` resolves a variable name; use [`process_env`] for the real
    /// environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &'static str| lookup(var).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_LOG_LEVEL) {
            self.log.level = v
                .parse()
                .map_err(|e: String| ConfigError::invalid_env(ENV_LOG_LEVEL, &v, e))?;
        }
        if let Some(v) = get(ENV_LOG_FORMAT) {
            self.log.format = v
                .parse()
                .map_err(|e: String| ConfigError::invalid_env(ENV_LOG_FORMAT, &v, e))?;
        }
        if let Some(v) = get(ENV_CHANNEL_BUFFER_LEN) {
            self.global.channel_buffer_len = parse_usize(ENV_CHANNEL_BUFFER_LEN, &v)?;
        }
        if let Some(v) = get(ENV_EXECUTABLE_PATH) {
            self.executable_path = Some(v);
        }
        if let Some(v) = get(ENV_OPEN_PORT) {
            self.open_port = Some(v);
        }
        if let Some(v) = get(ENV_DISCOVERY_POLL_INTERVAL) {
            self.discovery.poll_interval = parse_duration(ENV_DISCOVERY_POLL_INTERVAL, &v)?;
        }
        if let Some(v) = get(ENV_SYSTEM_WIDE) {
            self.discovery.system_wide = parse_bool(ENV_SYSTEM_WIDE, &v)?;
        }
        if let Some(v) = get(ENV_SKIP_GO_SPECIFIC_TRACERS) {
            self.discovery.skip_go_specific_tracers = parse_bool(ENV_SKIP_GO_SPECIFIC_TRACERS, &v)?;
        }
        if let Some(v) = get(ENV_BPF_PID_FILTER_OFF) {
            self.discovery.bpf_pid_filter_off = parse_bool(ENV_BPF_PID_FILTER_OFF, &v)?;
        }
        if let Some(v) = get(ENV_EXCLUDE_OTEL_INSTRUMENTED_SERVICES) {
            self.discovery.exclude_otel_instrumented_services =
                parse_bool(ENV_EXCLUDE_OTEL_INSTRUMENTED_SERVICES, &v)?;
        }
        if let Some(v) = get(ENV_ROUTES_UNMATCH) {
            self.routes.get_or_insert_with(RoutesConfig::default).unmatch = Some(v);
        }
        if let Some(v) = get(ENV_ROUTES_WILDCARD_CHAR) {
            self.routes
                .get_or_insert_with(RoutesConfig::default)
                .wildcard_char = v;
        }
        if let Some(v) = get(ENV_TRACE_PRINTER) {
            self.printer.mode = v
                .parse()
                .map_err(|e: String| ConfigError::invalid_env(ENV_TRACE_PRINTER, &v, e))?;
        }
        Ok(())
    }
}
