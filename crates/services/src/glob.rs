//! Glob attributes
//!
//! Wraps a compiled `globset` matcher together with its source text. An
//! empty pattern leaves the attribute unset, and an unset attribute
//! matches every input.

use std::fmt;
use std::str::FromStr;

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CriteriaError, Result};

/// Optional compiled glob pattern
#[derive(Clone, Default)]
pub struct GlobAttr {
    glob: Option<GlobMatcher>,
}

impl GlobAttr {
    /// Compile a pattern; empty text yields an unset attribute
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(Self::unset());
        }
        let glob = Glob::new(pattern).map_err(|source| CriteriaError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            glob: Some(glob.compile_matcher()),
        })
    }

    /// Attribute that matches everything
    #[inline]
    pub const fn unset() -> Self {
        Self { glob: None }
    }

    /// Whether a pattern was given
    #[inline]
    pub fn is_set(&self) -> bool {
        self.glob.is_some()
    }

    /// Source pattern, empty when unset
    pub fn pattern(&self) -> &str {
        self.glob.as_ref().map_or("", |g| g.glob().glob())
    }

    /// Match the whole input against the pattern
    #[inline]
    pub fn matches(&self, input: &str) -> bool {
        match &self.glob {
            Some(glob) => glob.is_match(input),
            None => true,
        }
    }
}

impl fmt::Debug for GlobAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobAttr").field(&self.pattern()).finish()
    }
}

impl fmt::Display for GlobAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

impl PartialEq for GlobAttr {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl Eq for GlobAttr {}

impl FromStr for GlobAttr {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Serialize for GlobAttr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.pattern())
    }
}

impl<'de> Deserialize<'de> for GlobAttr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::new(&text).map_err(serde::de::Error::custom)
    }
}
