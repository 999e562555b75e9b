//! Span attributes addressable by filters

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use vigil_protocol::{Span, SpanKind};

use crate::TransformError;

/// A span attribute a filter can be declared on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanAttribute {
    UrlPath,
    HttpRoute,
    HttpRequestMethod,
    HttpResponseStatusCode,
    ServiceName,
    ServiceNamespace,
    ServerAddress,
    ClientAddress,
    SpanKind,
}

impl SpanAttribute {
    pub const ALL: [Self; 9] = [
        Self::UrlPath,
        Self::HttpRoute,
        Self::HttpRequestMethod,
        Self::HttpResponseStatusCode,
        Self::ServiceName,
        Self::ServiceNamespace,
        Self::ServerAddress,
        Self::ClientAddress,
        Self::SpanKind,
    ];

    /// Semantic-convention name of the attribute
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UrlPath => "url.path",
            Self::HttpRoute => "http.route",
            Self::HttpRequestMethod => "http.request.method",
            Self::HttpResponseStatusCode => "http.response.status_code",
            Self::ServiceName => "service.name",
            Self::ServiceNamespace => "service.namespace",
            Self::ServerAddress => "server.address",
            Self::ClientAddress => "client.address",
            Self::SpanKind => "span.kind",
        }
    }

    /// Value of the attribute on a span; empty when the span lacks it
    pub fn value<'a>(&self, span: &'a Span) -> Cow<'a, str> {
        match self {
            Self::UrlPath => Cow::Borrowed(&span.path),
            Self::HttpRoute => Cow::Borrowed(&span.route),
            Self::HttpRequestMethod => Cow::Borrowed(&span.method),
            Self::HttpResponseStatusCode => match span.status {
                0 => Cow::Borrowed(""),
                status => Cow::Owned(status.to_string()),
            },
            Self::ServiceName => Cow::Borrowed(&span.service.name),
            Self::ServiceNamespace => Cow::Borrowed(&span.service.namespace),
            Self::ServerAddress => Cow::Borrowed(&span.host),
            Self::ClientAddress => Cow::Borrowed(&span.peer),
            Self::SpanKind => match span.kind {
                SpanKind::Unknown => Cow::Borrowed(""),
                kind => Cow::Borrowed(kind.as_str()),
            },
        }
    }
}

impl fmt::Display for SpanAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpanAttribute {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| TransformError::config(format!("unknown filter attribute '{s}'")))
    }
}
