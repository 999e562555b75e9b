//! Vigil Pipeline - Typed broadcast transport between stages
//!
//! Every stage of the agent runs as its own task and talks to the others
//! only through topics.
//!
//! # Architecture
//!
//! ```text
//! [capture] ──→ Topic<SpanBatch> ──→ TransformStage ──→ Topic<SpanBatch> ──┬──→ exporter
//!                                    (filter → routes)                      └──→ printer
//! ```
//!
//! # Key Design
//!
//! - **Per-subscriber queues**: each subscriber owns a bounded
//!   `tokio::sync::mpsc` queue, so subscribers never see each other's data
//! - **Back-pressure**: a full queue makes `send` wait; nothing is dropped
//! - **Explicit closure**: `close` drops the registered senders and fires a
//!   `CancellationToken`, waking blocked senders and receivers
//! - **Move to the last subscriber**: fan-out clones for all but the last
//!   subscriber, which receives the original
//!
//! # Example
//!
//! ```
//! use vigil_pipeline::Topic;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let topic = Topic::new("numbers", 8);
//!     let mut a = topic.subscribe();
//!     let mut b = topic.subscribe();
//!
//!     topic.send(42).await.unwrap();
//!     topic.close();
//!
//!     assert_eq!(a.recv().await, Some(42));
//!     assert_eq!(b.recv().await, Some(42));
//!     assert_eq!(a.recv().await, None);
//! });
//! ```

mod error;
mod metrics;
mod stage;
mod topic;

pub use error::{PipelineError, Result};
pub use metrics::{StageMetrics, StageSnapshot, TopicMetrics, TopicSnapshot};
pub use stage::TransformStage;
pub use topic::{Subscription, Topic};

pub use tokio::sync::mpsc::error::TryRecvError;
