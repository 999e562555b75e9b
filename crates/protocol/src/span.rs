//! Span types
//!
//! A `Span` is one captured request (server or client side). Capture fills in
//! the raw fields; transform stages assign `route` and may drop spans.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered group of spans moved between stages as one unit
pub type SpanBatch = Vec<Span>;

/// Protocol classification of a span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Not classified by capture
    #[default]
    Unknown,
    /// Incoming HTTP request
    Http,
    /// Outgoing HTTP request
    HttpClient,
    /// Incoming gRPC call
    Grpc,
    /// Outgoing gRPC call
    GrpcClient,
    /// SQL client query
    SqlClient,
    /// Redis client command
    RedisClient,
}

impl SpanKind {
    /// Get the string name of this kind
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Http => "http",
            Self::HttpClient => "http_client",
            Self::Grpc => "grpc",
            Self::GrpcClient => "grpc_client",
            Self::SqlClient => "sql_client",
            Self::RedisClient => "redis_client",
        }
    }

    /// True for HTTP server and client spans
    #[inline]
    pub const fn is_http(self) -> bool {
        matches!(self, Self::Http | Self::HttpClient)
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the service that produced a span
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceId {
    /// Service name (from the matching rule, or the executable name)
    pub name: String,
    /// Service namespace, empty if unset
    pub namespace: String,
}

impl ServiceId {
    /// Create a service identity
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// A single captured request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Span {
    /// Protocol classification
    pub kind: SpanKind,
    /// Request method (HTTP verb, gRPC method, SQL operation)
    pub method: String,
    /// Concrete request path as captured
    pub path: String,
    /// Low-cardinality route label; empty until classified
    pub route: String,
    /// Response status code
    pub status: u16,
    /// Client address
    pub peer: String,
    /// Server address
    pub host: String,
    /// Server port
    pub host_port: u16,
    /// Request start (unix nanos)
    pub start_ns: i64,
    /// Request end (unix nanos)
    pub end_ns: i64,
    /// Process that served or issued the request
    pub pid: u32,
    /// Service identity
    pub service: ServiceId,
}

impl Span {
    /// Create a span for a path with the given kind
    pub fn new(kind: SpanKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the route (as an upstream, protocol-aware stage would)
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    /// Set the service identity
    pub fn with_service(mut self, service: ServiceId) -> Self {
        self.service = service;
        self
    }

    /// Set the status code
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Whether a route was already assigned
    #[inline]
    pub fn has_route(&self) -> bool {
        !self.route.is_empty()
    }

    /// Request duration in nanoseconds (0 if timestamps are inconsistent)
    #[inline]
    pub fn duration_ns(&self) -> i64 {
        (self.end_ns - self.start_ns).max(0)
    }
}
