//! Check command - Validate a configuration
//!
//! Exits non-zero when the configuration cannot be loaded or is invalid.

use std::fmt::Write;

use anyhow::{Context, Result};
use vigil_config::{Config, ConfigError};

pub fn run(loaded: std::result::Result<Config, ConfigError>) -> Result<()> {
    let config = loaded.context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    print!("{}", summary(&config)?);
    Ok(())
}

/// Human-readable overview of what the agent will do
pub fn summary(config: &Config) -> Result<String> {
    let services = config.effective_services()?;
    let mut out = String::new();

    writeln!(out, "configuration ok")?;
    writeln!(
        out,
        "  discovery: {} service rules, {} exclude rules, {} default excludes",
        services.len(),
        config.discovery.exclude_services.len(),
        match &config.discovery.default_exclude_services {
            Some(custom) => format!("{} custom", custom.len()),
            None => "built-in".to_string(),
        }
    )?;
    writeln!(
        out,
        "  poll interval: {}, system wide: {}",
        humantime::format_duration(config.discovery.poll_interval),
        config.discovery.system_wide
    )?;
    match &config.routes {
        Some(routes) => writeln!(
            out,
            "  routes: {} patterns, unmatch {}",
            routes.patterns.len(),
            routes.unmatch_policy().as_str()
        )?,
        None => writeln!(out, "  routes: disabled")?,
    }
    if config.filter.is_empty() {
        writeln!(out, "  filters: none")?;
    } else {
        let attrs: Vec<&str> = config.filter.application.keys().map(String::as_str).collect();
        writeln!(out, "  filters: {}", attrs.join(", "))?;
    }
    writeln!(out, "  printer: {}", config.printer.mode.as_str())?;
    for warning in config.warnings() {
        writeln!(out, "warning: {warning}")?;
    }
    Ok(out)
}
