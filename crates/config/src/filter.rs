//! Span attribute filter configuration
//!
//! Each entry maps a span attribute to a glob that the attribute must
//! (`match`) or must not (`not_match`) satisfy.
//!
//! # Example
//!
//! ```toml
//! [filter.application]
//! "url.path" = { not_match = "/health*" }
//! "http.request.method" = { match = "{GET,POST}" }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

/// Attributes a filter can be declared on
pub const KNOWN_FILTER_ATTRIBUTES: &[&str] = &[
    "url.path",
    "http.route",
    "http.request.method",
    "http.response.status_code",
    "service.name",
    "service.namespace",
    "server.address",
    "client.address",
    "span.kind",
];

/// Check if an attribute can be filtered on
pub fn is_known_filter_attribute(attribute: &str) -> bool {
    KNOWN_FILTER_ATTRIBUTES.contains(&attribute)
}

/// One attribute filter; exactly one of the two fields must be set
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MatchDefinition {
    /// The attribute must match this glob
    #[serde(rename = "match")]
    pub matches: Option<String>,

    /// The attribute must not match this glob
    pub not_match: Option<String>,
}

impl MatchDefinition {
    pub fn matching(glob: impl Into<String>) -> Self {
        Self {
            matches: Some(glob.into()),
            not_match: None,
        }
    }

    pub fn not_matching(glob: impl Into<String>) -> Self {
        Self {
            matches: None,
            not_match: Some(glob.into()),
        }
    }

    /// Pattern and whether it is negated
    pub fn pattern(&self) -> Option<(&str, bool)> {
        match (&self.matches, &self.not_match) {
            (Some(glob), None) => Some((glob, false)),
            (None, Some(glob)) => Some((glob, true)),
            _ => None,
        }
    }

    /// Exactly one of `match` / `not_match` must be set
    pub fn validate(&self) -> Result<(), &'static str> {
        match (&self.matches, &self.not_match) {
            (Some(_), Some(_)) => Err("only one of 'match' or 'not_match' can be defined"),
            (None, None) => Err("one of 'match' or 'not_match' must be defined"),
            _ => Ok(()),
        }
    }
}

/// Attribute filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Filters applied to application spans
    pub application: BTreeMap<String, MatchDefinition>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.application.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_application_filters() {
        let toml = r#"
[application]
"url.path" = { not_match = "/health*" }
"http.request.method" = { match = "GET" }
"#;
        let config: FilterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.application.len(), 2);
        assert_eq!(
            config.application["url.path"],
            MatchDefinition::not_matching("/health*")
        );
        assert_eq!(
            config.application["http.request.method"].pattern(),
            Some(("GET", false))
        );
    }

    #[test]
    fn test_validate_requires_exactly_one() {
        assert!(MatchDefinition::matching("foo").validate().is_ok());
        assert!(MatchDefinition::not_matching("foo").validate().is_ok());
        let both = MatchDefinition {
            matches: Some("foo".into()),
            not_match: Some("foo".into()),
        };
        assert!(both.validate().is_err());
        assert!(both.pattern().is_none());
        assert!(MatchDefinition::default().validate().is_err());
    }

    #[test]
    fn test_known_attributes() {
        assert!(is_known_filter_attribute("url.path"));
        assert!(is_known_filter_attribute("span.kind"));
        assert!(!is_known_filter_attribute("db.statement"));
    }
}
