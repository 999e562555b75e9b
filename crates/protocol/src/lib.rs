//! Vigil Protocol - Core types shared by every pipeline stage
//!
//! This crate provides the data that flows between stages:
//! - `Span` / `SpanBatch` - captured request telemetry
//! - `SpanKind` - protocol classification of a span
//! - `ProcessInfo` - a process observed by discovery
//! - `Event<T>` / `EventType` - process lifecycle notifications
//! - `Instrumentable` - a process selected for instrumentation
//!
//! # Design Principles
//!
//! - **Owned batches**: a `SpanBatch` is owned by exactly one stage at a time;
//!   ownership moves on send
//! - **Serde everywhere**: all types serialize to JSON for debug taps and replay

mod event;
mod process;
mod span;

pub use event::{Event, EventType, Instrumentable};
pub use process::ProcessInfo;
pub use span::{ServiceId, Span, SpanBatch, SpanKind};
