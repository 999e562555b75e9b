//! Route Transformer - Low-cardinality route labels
//!
//! Assigns every span a `route` derived from its concrete path, so metrics
//! and traces group by endpoint rather than by identifier.
//!
//! # Resolution
//!
//! 1. A route set upstream (a protocol-aware decoder) is kept
//! 2. The first configured template matching the path wins
//! 3. Otherwise the unmatch policy decides:
//!
//! | Policy | Route |
//! |--------|-------|
//! | `unset` | empty (default) |
//! | `wildcard` | `/**` |
//! | `literal` | the path verbatim |
//! | `heuristic` | the path with identifier segments replaced |
//!
//! # TOML Example
//!
//! ```toml
//! [routes]
//! patterns = ["/user/:id", "/users/{id}/product/{pid}"]
//! unmatch = "heuristic"
//! wildcard_char = "*"
//! ```
//!
//! A missing `[routes]` section disables the transformer.

mod classifier;
mod heuristic;
mod matcher;

pub use classifier::{Classification, RouteClassifier, WILDCARD_ROUTE};
pub use heuristic::{HeuristicClassifier, HeuristicStats, MAX_SEGMENTS, is_identifier};
pub use matcher::RouteMatcher;

use crate::{TransformResult, Transformer};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use vigil_config::{RoutesConfig, UnmatchPolicy};
use vigil_protocol::SpanBatch;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Path without query string or fragment
#[inline]
pub(crate) fn strip_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(end) => &path[..end],
        None => path,
    }
}

/// Metrics for the route transformer
#[derive(Debug, Default)]
pub struct RouteMetrics {
    /// Batches processed
    pub batches_processed: AtomicU64,
    /// Spans received
    pub spans_received: AtomicU64,
    /// Spans routed by a template
    pub spans_matched: AtomicU64,
    /// Spans routed by the unmatch policy
    pub spans_unmatched: AtomicU64,
    /// Spans that arrived with a route
    pub spans_already_routed: AtomicU64,
    /// Spans routed by the heuristic
    pub spans_heuristic: AtomicU64,
}

impl RouteMetrics {
    /// Fraction of classified spans matched by a template (0.0 - 1.0)
    pub fn match_rate(&self) -> f64 {
        let matched = self.spans_matched.load(Ordering::Relaxed);
        let unmatched = self.spans_unmatched.load(Ordering::Relaxed);
        let total = matched + unmatched;
        if total == 0 {
            0.0
        } else {
            matched as f64 / total as f64
        }
    }

    fn record(&self, classification: Classification) {
        let counter = match classification {
            Classification::Preassigned => &self.spans_already_routed,
            Classification::Matched => &self.spans_matched,
            Classification::Unmatched(policy) => {
                if policy == UnmatchPolicy::Heuristic {
                    self.spans_heuristic.fetch_add(1, Ordering::Relaxed);
                }
                &self.spans_unmatched
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Route transformer
///
/// Classifies every span of a batch in place; batch size and order are
/// preserved. Disabled when no routes are configured.
pub struct RouteTransformer {
    classifier: Option<RouteClassifier>,
    metrics: RouteMetrics,
}

impl RouteTransformer {
    /// Create a route transformer; `None` yields a disabled transformer
    pub fn new(config: Option<&RoutesConfig>) -> Self {
        Self {
            classifier: config.map(RouteClassifier::new),
            metrics: RouteMetrics::default(),
        }
    }

    /// Get transformer metrics
    pub fn metrics(&self) -> &RouteMetrics {
        &self.metrics
    }

    pub fn classifier(&self) -> Option<&RouteClassifier> {
        self.classifier.as_ref()
    }

    fn process_batch(&self, mut batch: SpanBatch) -> SpanBatch {
        let Some(classifier) = &self.classifier else {
            return batch;
        };

        self.metrics.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .spans_received
            .fetch_add(batch.len() as u64, Ordering::Relaxed);

        for span in &mut batch {
            self.metrics.record(classifier.classify(span));
        }
        batch
    }
}

impl Transformer for RouteTransformer {
    fn transform<'a>(
        &'a self,
        batch: SpanBatch,
    ) -> Pin<Box<dyn Future<Output = TransformResult<SpanBatch>> + Send + 'a>> {
        Box::pin(async move { Ok(self.process_batch(batch)) })
    }

    fn name(&self) -> &'static str {
        "routes"
    }

    fn enabled(&self) -> bool {
        self.classifier.is_some()
    }
}

impl std::fmt::Debug for RouteTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTransformer")
            .field("classifier", &self.classifier)
            .field("metrics", &self.metrics)
            .finish()
    }
}
