//! Route classification configuration
//!
//! # Example
//!
//! ```toml
//! [routes]
//! patterns = ["/user/:id", "/users/{id}/product/{pid}"]
//! unmatch = "heuristic"
//! wildcard_char = "*"
//! ```

use serde::Deserialize;

/// Default bound of the heuristic memo table
pub const DEFAULT_HEURISTIC_CACHE_SIZE: usize = 8192;

/// Route assigned to spans matching no template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnmatchPolicy {
    /// Leave the route empty (default)
    #[default]
    Unset,
    /// Fixed catch-all route `/**`
    Wildcard,
    /// The path itself
    Literal,
    /// Path with identifier-like segments replaced by the wildcard char
    Heuristic,
}

impl UnmatchPolicy {
    /// Parse a configured value. `path` is accepted as an alias of
    /// `literal`. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "unset" => Some(Self::Unset),
            "wildcard" => Some(Self::Wildcard),
            "literal" | "path" => Some(Self::Literal),
            "heuristic" => Some(Self::Heuristic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Wildcard => "wildcard",
            Self::Literal => "literal",
            Self::Heuristic => "heuristic",
        }
    }
}

/// Route classification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Templates in precedence order. Parameters are `:name` or `{name}`.
    pub patterns: Vec<String>,

    /// Unmatch policy as written; see [`RoutesConfig::unmatch_policy`]
    pub unmatch: Option<String>,

    /// Text substituted for identifier segments in heuristic mode
    /// Default: "*"
    pub wildcard_char: String,

    /// Bound of the heuristic memo table, `0` for unbounded
    /// Default: 8192
    pub heuristic_cache_size: usize,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            unmatch: None,
            wildcard_char: "*".into(),
            heuristic_cache_size: DEFAULT_HEURISTIC_CACHE_SIZE,
        }
    }
}

impl RoutesConfig {
    /// Effective policy; unknown values fall back to `Unset`
    pub fn unmatch_policy(&self) -> UnmatchPolicy {
        self.unmatch
            .as_deref()
            .and_then(UnmatchPolicy::parse)
            .unwrap_or_default()
    }

    /// The configured unmatch value, if it is not a known policy
    pub fn unrecognized_unmatch(&self) -> Option<&str> {
        self.unmatch
            .as_deref()
            .filter(|v| UnmatchPolicy::parse(v).is_none())
    }
}
