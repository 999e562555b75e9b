//! Port enumerations
//!
//! A `PortEnum` is written in printer-pages notation: single ports and
//! inclusive ranges separated by commas, e.g. `80,443,8000-8999`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CriteriaError, Result};

/// Accepted grammar, checked before any numeric parsing
static VALID_PORT_ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+\s*(-\s*\d+\s*)?(,\s*\d+\s*(-\s*\d+\s*)?)*$").expect("Invalid regex")
});

/// A single port (`end == 0`) or an inclusive `[start, end]` range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortRange {
    /// First port of the range, or the single port
    pub start: u16,
    /// Last port of the range; `0` means single port
    pub end: u16,
}

impl PortRange {
    /// Single port
    #[inline]
    pub const fn single(port: u16) -> Self {
        Self {
            start: port,
            end: 0,
        }
    }

    /// Inclusive range
    #[inline]
    pub const fn range(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Whether this entry contains the given port
    #[inline]
    pub fn contains(&self, port: u16) -> bool {
        if self.end == 0 {
            self.start == port
        } else {
            self.start <= port && port <= self.end
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end == 0 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Ordered list of port ranges
///
/// An empty enumeration contains no port. Rules treat an empty
/// enumeration as "no port criterion".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortEnum {
    /// Parsed entries, in declaration order
    pub ranges: Vec<PortRange>,
}

impl PortEnum {
    /// Build from already-parsed ranges
    pub fn new(ranges: Vec<PortRange>) -> Self {
        Self { ranges }
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True if no entries were declared
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether any entry contains the given port
    pub fn matches(&self, port: u16) -> bool {
        self.ranges.iter().any(|r| r.contains(port))
    }

    /// Whether any of the given ports is contained
    pub fn matches_any(&self, ports: &[u16]) -> bool {
        ports.iter().any(|p| self.matches(*p))
    }
}

impl FromStr for PortEnum {
    type Err = CriteriaError;

    fn from_str(value: &str) -> Result<Self> {
        if !VALID_PORT_ENUM.is_match(value) {
            return Err(CriteriaError::invalid_port_range(value));
        }

        let mut ranges = Vec::new();
        for entry in value.split(',') {
            let mut bounds = entry.split('-');
            let start = parse_port(bounds.next().unwrap_or_default(), value)?;
            let end = match bounds.next() {
                Some(text) => parse_port(text, value)?,
                None => 0,
            };
            if end != 0 && end < start {
                return Err(CriteriaError::InvertedPortRange {
                    start,
                    end,
                    value: value.to_string(),
                });
            }
            ranges.push(PortRange { start, end });
        }
        Ok(Self { ranges })
    }
}

fn parse_port(text: &str, value: &str) -> Result<u16> {
    let text = text.trim();
    text.parse::<u16>()
        .map_err(|_| CriteriaError::PortOutOfRange {
            port: text.to_string(),
            value: value.to_string(),
        })
}

impl fmt::Display for PortEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

impl Serialize for PortEnum {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortEnum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PortEnumVisitor;

        impl Visitor<'_> for PortEnumVisitor {
            type Value = PortEnum;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a port number or a comma-separated list of ports and port ranges")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<PortEnum, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<PortEnum, E> {
                let port = u16::try_from(v).map_err(|_| {
                    E::custom(CriteriaError::PortOutOfRange {
                        port: v.to_string(),
                        value: v.to_string(),
                    })
                })?;
                Ok(PortEnum::new(vec![PortRange::single(port)]))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<PortEnum, E> {
                match u64::try_from(v) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Err(E::custom(CriteriaError::invalid_port_range(v.to_string()))),
                }
            }
        }

        deserializer.deserialize_any(PortEnumVisitor)
    }
}

#[cfg(test)]
#[path = "ports_test.rs"]
mod tests;
