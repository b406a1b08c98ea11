//! # Audit Event Sink
//!
//! Every subsystem publishes its audit events through an `EventSink<E>`.
//! Events are published only after the triggering operation has fully
//! succeeded, so a log replay never observes rolled-back transitions.

use parking_lot::RwLock;

/// Outbound port for audit events of type `E`.
pub trait EventSink<E>: Send + Sync {
    /// Publish a committed event.
    fn publish(&self, event: E);
}

/// Append-only in-memory event log.
#[derive(Debug)]
pub struct InMemoryEventLog<E> {
    events: RwLock<Vec<E>>,
}

impl<E> InMemoryEventLog<E> {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// Number of published events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Clone> InMemoryEventLog<E> {
    /// Copy of every published event, in order.
    pub fn events(&self) -> Vec<E> {
        self.events.read().clone()
    }

    /// Most recent event, if any.
    pub fn last(&self) -> Option<E> {
        self.events.read().last().cloned()
    }
}

impl<E> Default for InMemoryEventLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + Sync> EventSink<E> for InMemoryEventLog<E> {
    fn publish(&self, event: E) {
        self.events.write().push(event);
    }
}

/// Sink that drops every event. Used where no audit trail is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl<E> EventSink<E> for NullEventSink {
    fn publish(&self, _event: E) {}
}
