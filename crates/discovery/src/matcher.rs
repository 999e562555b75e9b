//! Service selection over process events
//!
//! Turns raw process lifecycle events into events about processes worth
//! instrumenting. A `Deleted` event only passes when the process was
//! previously forwarded, so consumers never see a deletion for something
//! they were not told about.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use vigil_pipeline::{Subscription, Topic};
use vigil_protocol::{Event, EventType, Instrumentable, ProcessInfo, ServiceId};
use vigil_services::ServiceSelector;

/// A batch of instrumentable process events
pub type InstrumentableEvents = Vec<Event<Instrumentable>>;

/// Filters process events through a `ServiceSelector`
#[derive(Debug)]
pub struct DiscoveryMatcher {
    selector: ServiceSelector,
    forwarded: HashMap<u32, ServiceId>,
}

impl DiscoveryMatcher {
    pub fn new(selector: ServiceSelector) -> Self {
        Self {
            selector,
            forwarded: HashMap::new(),
        }
    }

    /// Processes currently forwarded as instrumentable
    pub fn forwarded(&self) -> usize {
        self.forwarded.len()
    }

    /// Keep the events about eligible processes
    pub fn filter(&mut self, events: Vec<Event<ProcessInfo>>) -> InstrumentableEvents {
        let mut out = Vec::new();
        for event in events {
            match event.kind {
                EventType::Created => {
                    if let Some(service) = self.created(&event.obj) {
                        out.push(Event::created(Instrumentable {
                            process: event.obj,
                            service,
                        }));
                    }
                }
                EventType::Deleted => {
                    if let Some(service) = self.forwarded.remove(&event.obj.pid) {
                        out.push(Event::deleted(Instrumentable {
                            process: event.obj,
                            service,
                        }));
                    }
                }
            }
        }
        out
    }

    fn created(&mut self, process: &ProcessInfo) -> Option<ServiceId> {
        if self.forwarded.contains_key(&process.pid) {
            return None;
        }
        let selection = self.selector.select(process)?;
        let name = if selection.name.is_empty() {
            process.exe_name()
        } else {
            selection.name
        };
        let service = ServiceId::new(name, selection.namespace);

        tracing::debug!(
            pid = process.pid,
            exe = %process.exe_path,
            service = %service.name,
            "process selected"
        );
        self.forwarded.insert(process.pid, service.clone());
        Some(service)
    }

    /// Filter batches until cancelled or the input closes
    ///
    /// Closes `output` when the input closes.
    pub async fn run(
        mut self,
        mut input: Subscription<Vec<Event<ProcessInfo>>>,
        output: Topic<InstrumentableEvents>,
        cancel: CancellationToken,
    ) {
        tracing::info!(
            input = input.topic(),
            output = output.name(),
            "discovery matcher starting"
        );

        loop {
            let events = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                events = input.recv() => match events {
                    Some(events) => events,
                    None => {
                        output.close();
                        break;
                    }
                },
            };

            let selected = self.filter(events);
            if selected.is_empty() {
                continue;
            }
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = output.send(selected) => sent,
            };
            if sent.is_err() {
                break;
            }
        }

        tracing::info!(forwarded = self.forwarded(), "discovery matcher stopped");
    }
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
