//! Agent wiring
//!
//! ```text
//! ProcessWatcher ──→ [processes] ──→ DiscoveryMatcher ──→ [instrumentable] ──→ ProcessTracker
//!
//! capture ──→ [spans] ──→ TransformStage ──→ [export] ──┬──→ exporter
//!                         (filter → routes)              └──→ TracePrinter
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vigil_config::Config;
use vigil_discovery::{
    DiscoveryMatcher, InstrumentableEvents, ProcessEvents, ProcessSource, ProcessWatcher,
    SystemProcesses,
};
use vigil_pipeline::{Subscription, Topic, TransformStage};
use vigil_protocol::SpanBatch;
use vigil_services::ServiceSelector;
use vigil_transform::{Chain, FilterTransformer, RouteTransformer, Transformer};

use crate::error::{AgentError, Result};
use crate::printer::TracePrinter;
use crate::tracker::ProcessTracker;

/// Topic names
pub const PROCESSES_TOPIC: &str = "processes";
pub const INSTRUMENTABLE_TOPIC: &str = "instrumentable";
pub const SPANS_TOPIC: &str = "spans";
pub const EXPORT_TOPIC: &str = "export";

/// Owns the topics and stages of one agent
pub struct Instrumenter {
    config: Arc<Config>,
    source: Box<dyn ProcessSource>,
    selector: ServiceSelector,
    chain: Chain,
    processes: Topic<ProcessEvents>,
    instrumentable: Topic<InstrumentableEvents>,
    capture: Topic<SpanBatch>,
    capture_input: Subscription<SpanBatch>,
    export: Topic<SpanBatch>,
}

impl Instrumenter {
    /// Build the selector, the transform chain and the topics
    ///
    /// The transform stage subscribes to the capture topic here, so spans
    /// sent before `run` are not lost.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let selector = config.selector()?;
        let transformers: Vec<Box<dyn Transformer>> = vec![
            Box::new(FilterTransformer::new(&config.filter)?),
            Box::new(RouteTransformer::new(config.routes.as_ref())),
        ];
        let chain = Chain::new(transformers);

        let capacity = config.global.channel_buffer_len;
        let capture = Topic::new(SPANS_TOPIC, capacity);
        let capture_input = capture.subscribe();

        Ok(Self {
            source: Box::new(SystemProcesses::new()),
            selector,
            chain,
            processes: Topic::new(PROCESSES_TOPIC, capacity),
            instrumentable: Topic::new(INSTRUMENTABLE_TOPIC, capacity),
            capture,
            capture_input,
            export: Topic::new(EXPORT_TOPIC, capacity),
            config,
        })
    }

    /// Replace the export topic, typically with one an exporter subscribed to
    pub fn with_export_topic(mut self, topic: Topic<SpanBatch>) -> Self {
        self.export = topic;
        self
    }

    /// Replace the process table, for embedders and tests
    pub fn with_process_source(mut self, source: Box<dyn ProcessSource>) -> Self {
        self.source = source;
        self
    }

    /// Where span capture sends its batches
    pub fn capture_topic(&self) -> Topic<SpanBatch> {
        self.capture.clone()
    }

    /// Classified and filtered spans
    pub fn export_topic(&self) -> Topic<SpanBatch> {
        self.export.clone()
    }

    /// Processes selected for instrumentation
    pub fn instrumentable_topic(&self) -> Topic<InstrumentableEvents> {
        self.instrumentable.clone()
    }

    /// Active transformers in order
    pub fn transformers(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Run every stage until `cancel` fires or the capture topic closes and
    /// the transform stage has drained
    ///
    /// All topics are closed and all tasks joined before returning. The
    /// first task failure is returned.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let Self {
            config,
            source,
            selector,
            chain,
            processes,
            instrumentable,
            capture,
            capture_input,
            export,
        } = self;

        for warning in config.warnings() {
            tracing::warn!(%warning, "configuration warning");
        }

        let stop = cancel.child_token();
        let mut failure = None;

        // subscribe before any producer starts
        let matcher_input = processes.subscribe();
        let tracker_input = instrumentable.subscribe();
        let printer_input = config
            .printer
            .mode
            .is_enabled()
            .then(|| export.subscribe());

        let mut background: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

        let watcher = ProcessWatcher::new(source, config.discovery.poll_interval);
        background.push((
            "watcher",
            tokio::spawn(watcher.run(processes.clone(), stop.clone())),
        ));

        let matcher = DiscoveryMatcher::new(selector);
        background.push((
            "matcher",
            tokio::spawn(matcher.run(matcher_input, instrumentable.clone(), stop.clone())),
        ));

        let tracker_stop = stop.clone();
        background.push((
            "tracker",
            tokio::spawn(async move {
                ProcessTracker::new().run(tracker_input, tracker_stop).await;
            }),
        ));

        let stage = TransformStage::new("transform", chain);
        let stage_metrics = stage.metrics();
        let mut stage_task = tokio::spawn(stage.run(capture_input, export.clone(), stop.clone()));

        let mut printer_task = printer_input.map(|input| {
            let printer = TracePrinter::stdout(&config.printer);
            let printer_stop = stop.clone();
            tokio::spawn(async move {
                printer.run(input, printer_stop).await;
            })
        });

        tracing::info!(
            channel_buffer_len = config.global.channel_buffer_len,
            poll_interval = ?config.discovery.poll_interval,
            printer = config.printer.mode.as_str(),
            "agent running"
        );

        let stage_joined = tokio::select! {
            _ = cancel.cancelled() => None,
            joined = &mut stage_task => Some(joined),
        };
        let stage_done = stage_joined.is_some();
        let drained = matches!(stage_joined, Some(Ok(())));
        if let Some(joined) = stage_joined {
            record("transform", joined, &mut failure);
        }

        // a drained stage has closed the export topic
        if drained {
            tracing::info!("capture closed, transform stage drained");
            if let Some(task) = printer_task.take() {
                record("printer", task.await, &mut failure);
            }
        }

        stop.cancel();
        processes.close();
        instrumentable.close();
        capture.close();
        export.close();

        if !stage_done {
            record("transform", stage_task.await, &mut failure);
        }
        if let Some(task) = printer_task {
            record("printer", task.await, &mut failure);
        }
        for (name, task) in background {
            record(name, task.await, &mut failure);
        }

        let stage = stage_metrics.snapshot();
        tracing::info!(
            spans_in = stage.spans_in,
            spans_out = stage.spans_out,
            transforms_failed = stage.transforms_failed,
            "agent stopped"
        );

        failure.map_or(Ok(()), Err)
    }
}

fn record(
    task: &'static str,
    joined: std::result::Result<(), tokio::task::JoinError>,
    failure: &mut Option<AgentError>,
) {
    if let Err(e) = joined {
        tracing::error!(task, error = %e, "task failed");
        failure.get_or_insert(AgentError::task(task, e));
    }
}

#[cfg(test)]
#[path = "instrumenter_test.rs"]
mod tests;
