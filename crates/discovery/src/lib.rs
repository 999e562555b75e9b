//! Vigil Discovery - Finding the processes to instrument
//!
//! Two stages connected by topics:
//!
//! ```text
//! ProcessWatcher ──→ Topic<ProcessEvents> ──→ DiscoveryMatcher ──→ Topic<InstrumentableEvents>
//! (poll + diff)                               (ServiceSelector)
//! ```
//!
//! The watcher polls the process table on an interval and publishes
//! `Created`/`Deleted` events. The matcher keeps only the processes the
//! configured selection criteria accept and names their service.

mod error;
mod matcher;
mod ports;
mod watcher;

pub use error::{DiscoveryError, Result};
pub use matcher::{DiscoveryMatcher, InstrumentableEvents};
pub use ports::PortTable;
pub use watcher::{
    MIN_POLL_INTERVAL, PORT_RECHECK_POLLS, ProcessEvents, ProcessSource, ProcessWatcher,
    SystemProcesses,
};
