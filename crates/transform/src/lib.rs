//! Vigil - Transform
//!
//! Transformers that modify span batches in flight.
//!
//! # Overview
//!
//! Transformers sit between capture and export. They can:
//! - Assign low-cardinality route labels (`routes`)
//! - Drop spans on attribute filters (`filter`)
//!
//! # Design Principles
//!
//! - **Fast**: Transformers should add microseconds, not milliseconds
//! - **Non-blocking**: Never block on I/O or external services
//! - **Thread-safe**: Transformers may be called concurrently
//! - **Zero-cost when disabled**: Empty chain is a no-op
//!
//! # Architecture
//!
//! ```text
//! [SpanBatch] → [filter] → [routes] → [SpanBatch']
//! ```
//!
//! Transformers are chained together and applied in order. The `Chain`
//! struct handles sequencing and error propagation.
//!
//! # Example
//!
//! ```
//! use vigil_config::RoutesConfig;
//! use vigil_protocol::{Span, SpanKind};
//! use vigil_transform::RouteClassifier;
//!
//! let config = RoutesConfig {
//!     patterns: vec!["/user/:id".into()],
//!     ..Default::default()
//! };
//! let classifier = RouteClassifier::new(&config);
//!
//! let mut span = Span::new(SpanKind::Http, "/user/1234");
//! classifier.classify(&mut span);
//! assert_eq!(span.route, "/user/:id");
//! ```

mod chain;
mod error;
pub mod filter;
pub mod routes;

pub use chain::Chain;
pub use error::TransformError;
pub use filter::{FilterMetrics, FilterTransformer, SpanAttribute};
pub use routes::{
    Classification, HeuristicClassifier, HeuristicStats, RouteClassifier, RouteMatcher,
    RouteMetrics, RouteTransformer, WILDCARD_ROUTE,
};

use std::future::Future;
use std::pin::Pin;
use vigil_protocol::SpanBatch;

/// Result type for transformer operations
pub type TransformResult<T> = Result<T, TransformError>;

/// Trait for span batch transformers
///
/// Implementors must be `Send + Sync` to allow concurrent use across tasks.
///
/// # Design
///
/// Transformers should be:
/// - **Fast**: Complete in microseconds, not milliseconds
/// - **Non-blocking**: Never block on I/O in the transform path
/// - **Thread-safe**: May be called from multiple tasks concurrently
///
/// # Example
///
/// ```
/// use std::future::Future;
/// use std::pin::Pin;
/// use vigil_protocol::SpanBatch;
/// use vigil_transform::{TransformResult, Transformer};
///
/// struct Passthrough;
///
/// impl Transformer for Passthrough {
///     fn transform<'a>(
///         &'a self,
///         batch: SpanBatch,
///     ) -> Pin<Box<dyn Future<Output = TransformResult<SpanBatch>> + Send + 'a>> {
///         Box::pin(async move { Ok(batch) })
///     }
///
///     fn name(&self) -> &'static str {
///         "passthrough"
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Transform a batch, returning the modified batch
    ///
    /// The transformer can modify the batch in-place or return a new batch.
    /// Returning an error leaves the decision about the batch to the caller.
    fn transform<'a>(
        &'a self,
        batch: SpanBatch,
    ) -> Pin<Box<dyn Future<Output = TransformResult<SpanBatch>> + Send + 'a>>;

    /// Name of this transformer for logging and metrics
    fn name(&self) -> &'static str;

    /// Whether this transformer is currently enabled
    ///
    /// Disabled transformers are filtered out of chains at construction time.
    fn enabled(&self) -> bool {
        true
    }

    /// Clean up resources held by this transformer
    ///
    /// Called during graceful shutdown. Default implementation is a no-op.
    fn close(&self) -> TransformResult<()> {
        Ok(())
    }
}
