//! Transform stage - runs a transformer chain between two topics
//!
//! ```text
//! Subscription<SpanBatch> ──→ [Chain] ──→ Topic<SpanBatch>
//! ```
//!
//! The stage runs until its input closes (then closes its output, so
//! shutdown cascades downstream), its output closes, or the cancellation
//! token fires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use vigil_protocol::SpanBatch;
use vigil_transform::Chain;

use crate::metrics::StageMetrics;
use crate::topic::{Subscription, Topic};

#[cfg(test)]
#[path = "stage_test.rs"]
mod tests;

/// Chain runs slower than this are logged
const SLOW_TRANSFORM: Duration = Duration::from_millis(10);

/// A transformer chain wired between an input subscription and an output
/// topic
pub struct TransformStage {
    name: String,
    chain: Chain,
    metrics: Arc<StageMetrics>,
}

impl TransformStage {
    pub fn new(name: impl Into<String>, chain: Chain) -> Self {
        Self {
            name: name.into(),
            chain,
            metrics: Arc::new(StageMetrics::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the stage metrics, valid after `run` consumes the
    /// stage
    pub fn metrics(&self) -> Arc<StageMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Apply the chain, falling back to the original batch on error
    async fn apply(&self, batch: SpanBatch) -> SpanBatch {
        if !self.chain.is_enabled() {
            return batch;
        }

        let start = Instant::now();
        match self.chain.transform(batch.clone()).await {
            Ok(transformed) => {
                let duration = start.elapsed();
                if duration > SLOW_TRANSFORM {
                    tracing::warn!(
                        stage = %self.name,
                        duration_ms = duration.as_millis(),
                        transformers = ?self.chain.names(),
                        "slow transformer chain"
                    );
                }
                self.metrics.record_transform(duration);
                transformed
            }
            Err(e) => {
                tracing::warn!(
                    stage = %self.name,
                    error = %e,
                    transformers = ?self.chain.names(),
                    "transformer chain failed, forwarding original batch"
                );
                self.metrics.record_transform_error();
                batch
            }
        }
    }

    /// Run until input closes, output closes or `cancel` fires
    pub async fn run(
        self,
        mut input: Subscription<SpanBatch>,
        output: Topic<SpanBatch>,
        cancel: CancellationToken,
    ) {
        tracing::info!(
            stage = %self.name,
            input = input.topic(),
            output = output.name(),
            transformers = ?self.chain.names(),
            "transform stage starting"
        );

        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                batch = input.recv() => batch,
            };

            let Some(batch) = batch else {
                output.close();
                break;
            };
            self.metrics.record_received(batch.len());

            let batch = self.apply(batch).await;
            let spans = batch.len();

            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = output.send(batch) => sent,
            };
            if sent.is_err() {
                tracing::debug!(stage = %self.name, "output topic closed");
                break;
            }
            self.metrics.record_forwarded(spans);
        }

        if let Err(e) = self.chain.close() {
            tracing::warn!(stage = %self.name, error = %e, "failed to close transformers");
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            stage = %self.name,
            batches_received = snapshot.batches_received,
            batches_forwarded = snapshot.batches_forwarded,
            spans_in = snapshot.spans_in,
            spans_out = snapshot.spans_out,
            transforms_failed = snapshot.transforms_failed,
            "transform stage shutting down"
        );
    }
}

impl std::fmt::Debug for TransformStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformStage")
            .field("name", &self.name)
            .field("transformers", &self.chain.names())
            .finish()
    }
}
