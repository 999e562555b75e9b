//! Instrumented process tracking
//!
//! Keeps the set of processes discovery handed over for instrumentation.
//! The kernel instrumentation layer attaches and detaches from these pids.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use vigil_discovery::InstrumentableEvents;
use vigil_pipeline::Subscription;
use vigil_protocol::{EventType, Instrumentable};

#[derive(Debug, Default)]
pub struct ProcessTracker {
    processes: HashMap<u32, Instrumentable>,
}

impl ProcessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn get(&self, pid: u32) -> Option<&Instrumentable> {
        self.processes.get(&pid)
    }

    pub fn apply(&mut self, events: InstrumentableEvents) {
        for event in events {
            let pid = event.obj.process.pid;
            match event.kind {
                EventType::Created => {
                    tracing::info!(
                        pid,
                        exe = %event.obj.process.exe_path,
                        ports = ?event.obj.process.open_ports,
                        service = %event.obj.service,
                        "instrumenting process"
                    );
                    self.processes.insert(pid, event.obj);
                }
                EventType::Deleted => {
                    if self.processes.remove(&pid).is_some() {
                        tracing::info!(pid, service = %event.obj.service, "process exited");
                    }
                }
            }
        }
    }

    /// Track until cancelled or the input closes
    pub async fn run(
        mut self,
        mut input: Subscription<InstrumentableEvents>,
        cancel: CancellationToken,
    ) -> Self {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                events = input.recv() => match events {
                    Some(events) => self.apply(events),
                    None => break,
                },
            }
        }
        tracing::info!(instrumented = self.len(), "process tracker stopped");
        self
    }
}
