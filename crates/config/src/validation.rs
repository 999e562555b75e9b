//! Configuration validation
//!
//! Validates config consistency:
//! - Every selection rule carries at least one criterion
//! - Convenience criteria (`executable_path`, `open_port`) parse
//! - Something selects processes for instrumentation
//! - Polling intervals are non-zero
//! - Route settings are usable
//! - Attribute filters name known attributes with valid globs
//!
//! Problems that do not stop the agent are reported as [`ConfigWarning`]s.

use std::fmt;

use vigil_services::{CriteriaError, DefinitionCriteria, GlobAttr};

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::filter::is_known_filter_attribute;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_global(config)?;
    validate_discovery(config)?;
    validate_routes(config)?;
    validate_filters(config)?;
    validate_printer(config)?;
    Ok(())
}

fn validate_global(config: &Config) -> Result<()> {
    if config.global.channel_buffer_len == 0 {
        return Err(ConfigError::invalid_value(
            "global.channel_buffer_len",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_criteria(section: &'static str, criteria: &DefinitionCriteria) -> Result<()> {
    criteria.validate().map_err(|e| match e {
        CriteriaError::NoSelectionCriteria { index } => {
            ConfigError::no_selection_criteria(section, index)
        }
        other => ConfigError::criteria(section, other),
    })
}

fn validate_discovery(config: &Config) -> Result<()> {
    let discovery = &config.discovery;
    validate_criteria("discovery.services", &discovery.services)?;
    validate_criteria("discovery.exclude_services", &discovery.exclude_services)?;
    if let Some(ref defaults) = discovery.default_exclude_services {
        validate_criteria("discovery.default_exclude_services", defaults)?;
    }

    if discovery.poll_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "discovery.poll_interval",
            "must be greater than zero",
        ));
    }

    // parses the convenience rule
    let services = config.effective_services()?;

    if services.is_empty() && !discovery.system_wide {
        return Err(ConfigError::NothingToInstrument);
    }
    Ok(())
}

fn validate_routes(config: &Config) -> Result<()> {
    let Some(ref routes) = config.routes else {
        return Ok(());
    };
    if routes.wildcard_char.is_empty() {
        return Err(ConfigError::invalid_value(
            "routes.wildcard_char",
            "must not be empty",
        ));
    }
    if let Some(i) = routes.patterns.iter().position(|p| p.trim().is_empty()) {
        return Err(ConfigError::invalid_value(
            format!("routes.patterns[{i}]"),
            "must not be empty",
        ));
    }
    Ok(())
}

fn validate_printer(config: &Config) -> Result<()> {
    if config.printer.interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "printer.interval",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn validate_filters(config: &Config) -> Result<()> {
    for (attribute, definition) in &config.filter.application {
        let field = format!("filter.application.\"{attribute}\"");
        if !is_known_filter_attribute(attribute) {
            return Err(ConfigError::invalid_value(field, "unknown attribute"));
        }
        definition
            .validate()
            .map_err(|msg| ConfigError::invalid_value(field.clone(), msg))?;
        if let Some((pattern, _)) = definition.pattern() {
            GlobAttr::new(pattern)
                .map_err(|e| ConfigError::invalid_value(field.clone(), e.to_string()))?;
        }
    }
    Ok(())
}

/// Non-fatal configuration problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `routes.unmatch` is not a known policy; `unset` is used instead
    UnknownUnmatch {
        /// The configured value
        value: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownUnmatch { value } => write!(
                f,
                "unknown routes.unmatch value '{value}', falling back to 'unset'"
            ),
        }
    }
}

/// Collect non-fatal problems
pub fn collect_warnings(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    if let Some(value) = config
        .routes
        .as_ref()
        .and_then(|r| r.unrecognized_unmatch())
    {
        warnings.push(ConfigWarning::UnknownUnmatch {
            value: value.to_string(),
        });
    }
    warnings
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
