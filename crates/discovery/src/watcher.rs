//! Process watcher
//!
//! Polls the process table, diffs it against the previous poll and
//! publishes one batch of lifecycle events per poll.
//!
//! A process first seen without listening ports is re-examined for a few
//! polls, since servers usually bind shortly after they start. When ports
//! show up, a second `Created` event carries them.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use vigil_pipeline::Topic;
use vigil_protocol::{Event, ProcessInfo};

use crate::ports::PortTable;

#[cfg(test)]
#[path = "watcher_test.rs"]
mod tests;

/// Polls after first sight during which a portless process is re-examined
pub const PORT_RECHECK_POLLS: u8 = 3;

/// Shortest accepted poll interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A batch of process lifecycle events
pub type ProcessEvents = Vec<Event<ProcessInfo>>;

/// Source of process table snapshots
pub trait ProcessSource: Send + 'static {
    /// Current processes; `open_ports` may be left empty
    fn processes(&mut self) -> Vec<ProcessInfo>;

    /// Fill in listening ports
    fn resolve_ports(&mut self, _processes: &mut [ProcessInfo]) {}
}

impl ProcessSource for Box<dyn ProcessSource> {
    fn processes(&mut self) -> Vec<ProcessInfo> {
        (**self).processes()
    }

    fn resolve_ports(&mut self, processes: &mut [ProcessInfo]) {
        (**self).resolve_ports(processes)
    }
}

/// Process table of the local host
pub struct SystemProcesses {
    system: System,
    own_pid: u32,
}

impl SystemProcesses {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            own_pid: std::process::id(),
        }
    }
}

impl Default for SystemProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SystemProcesses {
    fn processes(&mut self) -> Vec<ProcessInfo> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
        );

        self.system
            .processes()
            .values()
            .filter(|p| p.thread_kind().is_none())
            .filter(|p| p.pid().as_u32() != self.own_pid)
            .map(|p| {
                ProcessInfo::new(
                    p.pid().as_u32(),
                    p.parent().map_or(0, |pp| pp.as_u32()),
                    p.exe()
                        .map(|exe| exe.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                )
            })
            .collect()
    }

    fn resolve_ports(&mut self, processes: &mut [ProcessInfo]) {
        if processes.is_empty() {
            return;
        }
        let table = match PortTable::load() {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(error = %e, "listening ports unavailable");
                return;
            }
        };
        for process in processes {
            match table.ports_of(process.pid) {
                Ok(ports) => process.open_ports = ports,
                // processes exit and restrict /proc access all the time
                Err(e) => tracing::trace!(error = %e, "skipping ports"),
            }
        }
    }
}

/// Publishes process lifecycle events
pub struct ProcessWatcher<S> {
    source: S,
    interval: Duration,
    known: HashMap<u32, ProcessInfo>,
    port_rechecks: HashMap<u32, u8>,
}

impl ProcessWatcher<SystemProcesses> {
    /// Watch the local host
    pub fn system(interval: Duration) -> Self {
        Self::new(SystemProcesses::new(), interval)
    }
}

impl<S: ProcessSource> ProcessWatcher<S> {
    /// `interval` is raised to [`MIN_POLL_INTERVAL`] if shorter
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source,
            interval: interval.max(MIN_POLL_INTERVAL),
            known: HashMap::new(),
            port_rechecks: HashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Processes seen by the last poll
    pub fn known(&self) -> usize {
        self.known.len()
    }

    /// Diff the current process table against the previous poll
    ///
    /// Deletions come first, then creations, each ordered by pid.
    pub fn poll(&mut self) -> ProcessEvents {
        let mut current = self.source.processes();
        current.sort_unstable_by_key(|p| p.pid);

        let mut events = Vec::new();
        let mut fresh = Vec::new();
        let mut recheck = Vec::new();
        let mut alive = HashSet::with_capacity(current.len());

        for process in current {
            alive.insert(process.pid);
            match self.known.get(&process.pid) {
                Some(known) if known.exe_path == process.exe_path => {
                    if self.port_rechecks.contains_key(&process.pid) {
                        recheck.push(process);
                    }
                }
                Some(_) => {
                    // pid reused by another executable
                    self.forget(process.pid, &mut events);
                    fresh.push(process);
                }
                None => fresh.push(process),
            }
        }

        let mut gone: Vec<u32> = self
            .known
            .keys()
            .filter(|pid| !alive.contains(*pid))
            .copied()
            .collect();
        gone.sort_unstable();
        for pid in gone {
            self.forget(pid, &mut events);
        }

        self.source.resolve_ports(&mut fresh);
        for process in fresh {
            if process.open_ports.is_empty() {
                self.port_rechecks.insert(process.pid, PORT_RECHECK_POLLS);
            }
            self.known.insert(process.pid, process.clone());
            events.push(Event::created(process));
        }

        self.source.resolve_ports(&mut recheck);
        for process in recheck {
            if process.open_ports.is_empty() {
                if let Some(left) = self.port_rechecks.get_mut(&process.pid) {
                    *left = left.saturating_sub(1);
                    if *left == 0 {
                        self.port_rechecks.remove(&process.pid);
                    }
                }
                continue;
            }
            self.port_rechecks.remove(&process.pid);
            self.known.insert(process.pid, process.clone());
            events.push(Event::created(process));
        }

        events
    }

    fn forget(&mut self, pid: u32, events: &mut ProcessEvents) {
        self.port_rechecks.remove(&pid);
        if let Some(old) = self.known.remove(&pid) {
            events.push(Event::deleted(old));
        }
    }

    /// Poll every interval until cancelled or the output topic closes
    pub async fn run(mut self, output: Topic<ProcessEvents>, cancel: CancellationToken) {
        tracing::info!(
            interval = ?self.interval,
            output = output.name(),
            "process watcher starting"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let polled = tokio::task::spawn_blocking(move || {
                let events = self.poll();
                (self, events)
            })
            .await;
            let events = match polled {
                Ok((watcher, events)) => {
                    self = watcher;
                    events
                }
                Err(e) => {
                    tracing::error!(error = %e, "process poll failed");
                    return;
                }
            };

            if events.is_empty() {
                continue;
            }
            tracing::debug!(events = events.len(), known = self.known(), "process table changed");

            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = output.send(events) => sent,
            };
            if sent.is_err() {
                break;
            }
        }

        tracing::info!(known = self.known(), "process watcher stopped");
    }
}
