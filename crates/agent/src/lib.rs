//! Vigil Agent - Pipeline assembly
//!
//! Builds every stage from a `Config` and connects them through topics.
//! Kernel capture and span export live outside this crate: capture sends
//! `SpanBatch`es to [`Instrumenter::capture_topic`] and exporters subscribe
//! to [`Instrumenter::export_topic`] (or hand in their own topic with
//! [`Instrumenter::with_export_topic`]).
//!
//! # Example
//!
//! ```no_run
//! use std::str::FromStr;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use vigil_agent::Instrumenter;
//! use vigil_config::Config;
//!
//! # async fn run() -> vigil_agent::Result<()> {
//! let config = Config::from_str("open_port = \"8080\"")?;
//! let agent = Instrumenter::new(Arc::new(config))?;
//! let mut exported = agent.export_topic().subscribe();
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(agent.run(cancel.clone()));
//! while let Some(batch) = exported.recv().await {
//!     println!("{} spans", batch.len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod instrumenter;
mod printer;
mod tracker;

pub use error::{AgentError, Result};
pub use instrumenter::{
    EXPORT_TOPIC, INSTRUMENTABLE_TOPIC, Instrumenter, PROCESSES_TOPIC, SPANS_TOPIC,
};
pub use printer::{TracePrinter, format_text};
pub use tracker::ProcessTracker;
