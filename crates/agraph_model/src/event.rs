// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deferred lifecycle events.
//!
//! While callbacks are disabled, lifecycle notifications are handed to an
//! [`EventSink`] instead of the discipline stack. Re-enabling callbacks drains
//! the sink and replays the events in the order they were recorded.

use crate::object::ObjectInfo;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Opaque handle to the attribute touched by an update
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrSym {
    /// Attribute name
    pub name: String,
}

impl AttrSym {
    /// Create a handle for a named attribute
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Lifecycle event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Object created
    Initialize,
    /// Attribute modified
    Update,
    /// Object about to be removed
    Delete,
}

/// A lifecycle event captured while callbacks were disabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// What happened
    pub kind: EventKind,
    /// The object as it was when the event fired
    pub object: ObjectInfo,
    /// Modified attribute, for updates
    pub attr: Option<AttrSym>,
}

/// Receives lifecycle events while callbacks are disabled
pub trait EventSink {
    /// Store an event
    fn record(&mut self, event: RecordedEvent);

    /// Take every stored event, oldest first
    fn drain(&mut self) -> Vec<RecordedEvent>;

    /// Number of stored events
    fn len(&self) -> usize;

    /// Whether nothing is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// FIFO event sink
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<RecordedEvent>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at the stored events
    pub fn iter(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.events.iter()
    }
}

impl EventSink for EventQueue {
    fn record(&mut self, event: RecordedEvent) {
        self.events.push_back(event);
    }

    fn drain(&mut self) -> Vec<RecordedEvent> {
        self.events.drain(..).collect()
    }

    fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{NodeKey, ObjKind, Object};
    use crate::tree::GraphKey;

    fn info(id: u64) -> ObjectInfo {
        ObjectInfo {
            object: Object::Node(NodeKey(0)),
            kind: ObjKind::Node,
            id,
            seq: id,
            graph: GraphKey(0),
            name: None,
        }
    }

    #[test]
    fn test_queue_preserves_order() {
        let mut queue = EventQueue::new();
        queue.record(RecordedEvent {
            kind: EventKind::Initialize,
            object: info(1),
            attr: None,
        });
        queue.record(RecordedEvent {
            kind: EventKind::Update,
            object: info(1),
            attr: Some(AttrSym::new("color")),
        });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(drained[0].kind, EventKind::Initialize);
        assert_eq!(drained[1].attr.as_ref().map(|a| a.name.as_str()), Some("color"));
    }
}
