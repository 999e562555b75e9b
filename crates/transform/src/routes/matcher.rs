//! Route templates
//!
//! A template such as `/users/{id}/product/:pid` is compiled into literal
//! and parameter segments. A concrete path matches when it has the same
//! number of segments and every literal segment is equal. Parameters
//! match any segment, including an empty one.

use super::strip_query;

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

impl Segment {
    fn parse(text: &str) -> Self {
        let is_param = (text.len() > 1 && text.starts_with(':'))
            || (text.len() > 2 && text.starts_with('{') && text.ends_with('}'));
        if is_param {
            Self::Param
        } else {
            Self::Literal(text.to_string())
        }
    }

    #[inline]
    fn matches(&self, segment: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == segment,
            Self::Param => true,
        }
    }
}

#[derive(Debug, Clone)]
struct Template {
    text: String,
    segments: Vec<Segment>,
}

impl Template {
    fn compile(text: &str) -> Self {
        Self {
            text: text.to_string(),
            segments: text.split('/').map(Segment::parse).collect(),
        }
    }

    fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/');
        for segment in &self.segments {
            match parts.next() {
                Some(part) if segment.matches(part) => {}
                _ => return false,
            }
        }
        parts.next().is_none()
    }
}

/// Ordered list of compiled route templates
#[derive(Debug, Clone, Default)]
pub struct RouteMatcher {
    templates: Vec<Template>,
}

impl RouteMatcher {
    /// Compile templates; order defines precedence
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            templates: patterns
                .iter()
                .map(|p| Template::compile(p.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Text of the first template matching `path`
    ///
    /// Query strings and fragments are ignored.
    pub fn find(&self, path: &str) -> Option<&str> {
        let path = strip_query(path);
        self.templates
            .iter()
            .find(|t| t.matches(path))
            .map(|t| t.text.as_str())
    }
}
