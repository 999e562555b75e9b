//! Pipeline metrics
//!
//! Atomic counters for topics and transform stages.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics for one broadcast topic
#[derive(Debug, Default)]
pub struct TopicMetrics {
    /// Items accepted by `send`
    items_sent: AtomicU64,

    /// Items handed to individual subscribers
    deliveries: AtomicU64,

    /// Times a send waited on a full subscriber buffer
    backpressure_waits: AtomicU64,

    /// Sends rejected because the topic was closed
    sends_rejected: AtomicU64,

    /// Subscribers removed after their receiver was dropped
    subscribers_pruned: AtomicU64,
}

impl TopicMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            items_sent: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            backpressure_waits: AtomicU64::new(0),
            sends_rejected: AtomicU64::new(0),
            subscribers_pruned: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_sent(&self) {
        self.items_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_backpressure(&self) {
        self.backpressure_waits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected(&self) {
        self.sends_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_pruned(&self, count: usize) {
        self.subscribers_pruned
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    #[inline]
    pub fn snapshot(&self) -> TopicSnapshot {
        TopicSnapshot {
            items_sent: self.items_sent.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            backpressure_waits: self.backpressure_waits.load(Ordering::Relaxed),
            sends_rejected: self.sends_rejected.load(Ordering::Relaxed),
            subscribers_pruned: self.subscribers_pruned.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of topic metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopicSnapshot {
    pub items_sent: u64,
    pub deliveries: u64,
    pub backpressure_waits: u64,
    pub sends_rejected: u64,
    pub subscribers_pruned: u64,
}

/// Metrics for a transform stage
#[derive(Debug, Default)]
pub struct StageMetrics {
    /// Batches received from the input topic
    batches_received: AtomicU64,

    /// Batches forwarded to the output topic
    batches_forwarded: AtomicU64,

    /// Spans received
    spans_in: AtomicU64,

    /// Spans forwarded
    spans_out: AtomicU64,

    /// Failed chain runs (original batch forwarded)
    transforms_failed: AtomicU64,

    /// Total transform duration in nanoseconds
    transform_duration_ns: AtomicU64,
}

impl StageMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            batches_forwarded: AtomicU64::new(0),
            spans_in: AtomicU64::new(0),
            spans_out: AtomicU64::new(0),
            transforms_failed: AtomicU64::new(0),
            transform_duration_ns: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_received(&self, spans: usize) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.spans_in.fetch_add(spans as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_forwarded(&self, spans: usize) {
        self.batches_forwarded.fetch_add(1, Ordering::Relaxed);
        self.spans_out.fetch_add(spans as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_transform(&self, duration: Duration) {
        self.transform_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_transform_error(&self) {
        self.transforms_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            batches_forwarded: self.batches_forwarded.load(Ordering::Relaxed),
            spans_in: self.spans_in.load(Ordering::Relaxed),
            spans_out: self.spans_out.load(Ordering::Relaxed),
            transforms_failed: self.transforms_failed.load(Ordering::Relaxed),
            transform_duration_ns: self.transform_duration_ns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of stage metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageSnapshot {
    pub batches_received: u64,
    pub batches_forwarded: u64,
    pub spans_in: u64,
    pub spans_out: u64,
    pub transforms_failed: u64,
    pub transform_duration_ns: u64,
}

impl StageSnapshot {
    /// Fraction of received spans dropped by the chain
    ///
    /// Returns None if no spans have been received.
    #[inline]
    pub fn drop_rate(&self) -> Option<f64> {
        if self.spans_in == 0 {
            None
        } else {
            Some(self.spans_in.saturating_sub(self.spans_out) as f64 / self.spans_in as f64)
        }
    }
}
