//! Lifecycle events

use serde::{Deserialize, Serialize};

use crate::{ProcessInfo, ServiceId};

/// Kind of lifecycle change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Object appeared
    Created,
    /// Object disappeared
    Deleted,
}

/// A lifecycle notification about an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<T> {
    /// What happened
    #[serde(rename = "type")]
    pub kind: EventType,
    /// Subject of the event
    pub obj: T,
}

impl<T> Event<T> {
    /// Object created
    #[inline]
    pub fn created(obj: T) -> Self {
        Self {
            kind: EventType::Created,
            obj,
        }
    }

    /// Object deleted
    #[inline]
    pub fn deleted(obj: T) -> Self {
        Self {
            kind: EventType::Deleted,
            obj,
        }
    }
}

/// A process selected for instrumentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrumentable {
    /// The process
    pub process: ProcessInfo,
    /// Service identity assigned by the matching rule
    pub service: ServiceId,
}
