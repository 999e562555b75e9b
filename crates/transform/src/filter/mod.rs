//! Filter Transformer - Drop unwanted spans
//!
//! Drops spans whose attributes fail the configured globs, e.g. health
//! checks or internal endpoints.
//!
//! # Configuration
//!
//! | Option | Type | Description |
//! |--------|------|-------------|
//! | `match` | glob | The attribute must match |
//! | `not_match` | glob | The attribute must not match |
//!
//! Exactly one of the two is set per attribute. A span passes when every
//! filter passes. A span lacking the attribute fails `match` and passes
//! `not_match`.
//!
//! # TOML Example
//!
//! ```toml
//! [filter.application]
//! "url.path" = { not_match = "/health*" }
//! "http.request.method" = { match = "{GET,POST}" }
//! ```

mod attribute;

pub use attribute::SpanAttribute;

use crate::{TransformError, TransformResult, Transformer};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use vigil_config::FilterConfig;
use vigil_protocol::{Span, SpanBatch};
use vigil_services::GlobAttr;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Metrics for the filter transformer
#[derive(Debug, Default)]
pub struct FilterMetrics {
    /// Batches processed
    pub batches_processed: AtomicU64,
    /// Spans received
    pub spans_received: AtomicU64,
    /// Spans passed
    pub spans_passed: AtomicU64,
    /// Spans dropped
    pub spans_dropped: AtomicU64,
}

impl FilterMetrics {
    /// Get drop rate (0.0 - 1.0)
    pub fn drop_rate(&self) -> f64 {
        let received = self.spans_received.load(Ordering::Relaxed);
        let dropped = self.spans_dropped.load(Ordering::Relaxed);
        if received == 0 {
            0.0
        } else {
            dropped as f64 / received as f64
        }
    }
}

#[derive(Debug)]
struct AttributeFilter {
    attribute: SpanAttribute,
    glob: GlobAttr,
    negate: bool,
}

impl AttributeFilter {
    fn passes(&self, span: &Span) -> bool {
        let value = self.attribute.value(span);
        if value.is_empty() {
            return self.negate;
        }
        self.glob.matches(&value) != self.negate
    }
}

/// Filter transformer
///
/// Stateless apart from metrics. Disabled when no filters are configured.
pub struct FilterTransformer {
    filters: Vec<AttributeFilter>,
    metrics: FilterMetrics,
}

impl FilterTransformer {
    /// Create a filter transformer from the `[filter]` section
    pub fn new(config: &FilterConfig) -> TransformResult<Self> {
        let filters = config
            .application
            .iter()
            .map(|(name, definition)| {
                let attribute: SpanAttribute = name.parse()?;
                let (pattern, negate) = definition.pattern().ok_or_else(|| {
                    TransformError::config(format!(
                        "filter '{name}': exactly one of 'match' or 'not_match' must be defined"
                    ))
                })?;
                let glob = GlobAttr::new(pattern)
                    .map_err(|e| TransformError::config(format!("filter '{name}': {e}")))?;
                Ok(AttributeFilter {
                    attribute,
                    glob,
                    negate,
                })
            })
            .collect::<TransformResult<Vec<_>>>()?;

        Ok(Self {
            filters,
            metrics: FilterMetrics::default(),
        })
    }

    /// Get transformer metrics
    pub fn metrics(&self) -> &FilterMetrics {
        &self.metrics
    }

    /// Whether a span passes every filter
    pub fn passes(&self, span: &Span) -> bool {
        self.filters.iter().all(|f| f.passes(span))
    }

    fn process_batch(&self, mut batch: SpanBatch) -> SpanBatch {
        self.metrics.batches_processed.fetch_add(1, Ordering::Relaxed);

        let received = batch.len();
        self.metrics
            .spans_received
            .fetch_add(received as u64, Ordering::Relaxed);

        batch.retain(|span| self.passes(span));

        let passed = batch.len();
        self.metrics
            .spans_passed
            .fetch_add(passed as u64, Ordering::Relaxed);
        self.metrics
            .spans_dropped
            .fetch_add((received - passed) as u64, Ordering::Relaxed);

        batch
    }
}

impl Transformer for FilterTransformer {
    fn transform<'a>(
        &'a self,
        batch: SpanBatch,
    ) -> Pin<Box<dyn Future<Output = TransformResult<SpanBatch>> + Send + 'a>> {
        Box::pin(async move { Ok(self.process_batch(batch)) })
    }

    fn name(&self) -> &'static str {
        "filter"
    }

    fn enabled(&self) -> bool {
        !self.filters.is_empty()
    }
}

impl std::fmt::Debug for FilterTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterTransformer")
            .field("filters", &self.filters)
            .field("metrics", &self.metrics)
            .finish()
    }
}
