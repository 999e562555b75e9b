//! Topic - Typed broadcast with per-subscriber back-pressure
//!
//! A `Topic<T>` delivers every sent item to every subscriber registered at
//! the time of the send. Each subscriber owns a bounded queue of the
//! topic's capacity; a full queue makes `send` wait, so the slowest
//! subscriber paces every producer.
//!
//! ```text
//!                     ┌──→ [queue] ──→ Subscription (exporter)
//! producer ──→ Topic ─┼──→ [queue] ──→ Subscription (printer)
//!                     └──→ [queue] ──→ Subscription (...)
//! ```
//!
//! Closing a topic drops every registered sender and fires a closure
//! token, so blocked senders return `TopicClosed` and receivers drain
//! what is buffered before observing the end of the stream.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};
use crate::metrics::TopicMetrics;

#[cfg(test)]
#[path = "topic_test.rs"]
mod tests;

struct Inner<T> {
    name: String,
    capacity: usize,
    subscribers: RwLock<Vec<mpsc::Sender<T>>>,
    closed: CancellationToken,
    metrics: TopicMetrics,
}

/// Producer handle of a broadcast topic
///
/// Cheap to clone; all clones address the same topic.
pub struct Topic<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Topic<T> {
    /// Create a topic; `capacity` is applied to each subscriber (minimum 1)
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                capacity: capacity.max(1),
                subscribers: RwLock::new(Vec::new()),
                closed: CancellationToken::new(),
                metrics: TopicMetrics::new(),
            }),
        }
    }

    /// Deliver `item` to every current subscriber
    ///
    /// Waits while a subscriber's queue is full. Returns `TopicClosed` if
    /// the topic is closed before or during delivery. Subscribers whose
    /// receiver was dropped are pruned.
    pub async fn send(&self, item: T) -> Result<()>
    where
        T: Clone,
    {
        let inner = &*self.inner;
        if inner.closed.is_cancelled() {
            return Err(self.rejected());
        }

        let senders = inner.subscribers.read().clone();
        inner.metrics.record_sent();

        let last = senders.len().saturating_sub(1);
        let mut item = Some(item);
        let mut pruned = false;

        for (i, tx) in senders.iter().enumerate() {
            if inner.closed.is_cancelled() {
                return Err(self.rejected());
            }

            let permit = match tx.try_reserve() {
                Ok(permit) => permit,
                Err(TrySendError::Closed(())) => {
                    pruned = true;
                    continue;
                }
                Err(TrySendError::Full(())) => {
                    inner.metrics.record_backpressure();
                    tracing::trace!(topic = %inner.name, "subscriber queue full, waiting");
                    tokio::select! {
                        biased;
                        _ = inner.closed.cancelled() => return Err(self.rejected()),
                        reserved = tx.reserve() => match reserved {
                            Ok(permit) => permit,
                            Err(_) => {
                                pruned = true;
                                continue;
                            }
                        },
                    }
                }
            };

            let value = if i == last { item.take() } else { item.clone() };
            if let Some(value) = value {
                permit.send(value);
                inner.metrics.record_delivery();
            }
        }

        if pruned {
            self.prune();
        }
        Ok(())
    }

    /// Register a subscriber observing items sent from now on
    ///
    /// On a closed topic the returned subscription is already closed.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let mut subscribers = self.inner.subscribers.write();
        if !self.inner.closed.is_cancelled() {
            subscribers.push(tx);
        }
        Subscription {
            topic: self.inner.name.clone(),
            rx,
        }
    }

    /// Close the topic; idempotent
    pub fn close(&self) {
        if self.inner.closed.is_cancelled() {
            return;
        }
        self.inner.closed.cancel();
        let dropped = std::mem::take(&mut *self.inner.subscribers.write());
        tracing::debug!(
            topic = %self.inner.name,
            subscribers = dropped.len(),
            "topic closed"
        );
    }

    fn prune(&self) {
        let mut subscribers = self.inner.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|tx| !tx.is_closed());
        let removed = before - subscribers.len();
        if removed > 0 {
            self.inner.metrics.record_pruned(removed);
            tracing::debug!(topic = %self.inner.name, removed, "pruned dropped subscribers");
        }
    }

    fn rejected(&self) -> PipelineError {
        self.inner.metrics.record_rejected();
        PipelineError::topic_closed(self.inner.name.as_str())
    }
}

impl<T> Topic<T> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Per-subscriber queue capacity
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Registered subscribers, including dropped ones not yet pruned
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Resolves once the topic is closed
    pub async fn closed(&self) {
        self.inner.closed.cancelled().await
    }

    pub fn metrics(&self) -> &TopicMetrics {
        &self.inner.metrics
    }
}

impl<T> fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.inner.name)
            .field("capacity", &self.inner.capacity)
            .field("subscribers", &self.subscriber_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Receiving end of a topic subscription
///
/// Dropping it unsubscribes; the topic prunes it on its next send.
pub struct Subscription<T> {
    topic: String,
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    /// Next item, or `None` once the topic is closed and the queue drained
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next item without waiting
    pub fn try_recv(&mut self) -> std::result::Result<T, TryRecvError> {
        self.rx.try_recv()
    }

    /// Name of the topic this subscription belongs to
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Items buffered and not yet received
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("buffered", &self.len())
            .finish()
    }
}
