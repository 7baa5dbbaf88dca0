//! In-process broadcast bus with per-observer ordered queues.
//!
//! Stands in for the transport layer: delivery is at-least-once and
//! in-order per sender, which is exactly the contract observers rely on.

use std::collections::VecDeque;

use crate::events::AgentEvent;

/// Handle identifying one subscriber's queue on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(usize);

/// Fan-out queue: every broadcast lands in every observer's queue in
/// publication order.
#[derive(Debug, Default)]
pub struct EventBus {
    queues: Vec<VecDeque<AgentEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer. Events broadcast before subscription are
    /// not replayed.
    pub fn subscribe(&mut self) -> ObserverId {
        self.queues.push(VecDeque::new());
        ObserverId(self.queues.len() - 1)
    }

    /// Deliver an event to every observer queue.
    pub fn broadcast(&mut self, event: &AgentEvent) {
        for queue in &mut self.queues {
            queue.push_back(event.clone());
        }
    }

    /// Take all pending events for one observer, oldest first.
    pub fn drain(&mut self, observer: ObserverId) -> Vec<AgentEvent> {
        match self.queues.get_mut(observer.0) {
            Some(queue) => queue.drain(..).collect(),
            None => Vec::new(),
        }
    }

    /// Number of undelivered events for one observer.
    pub fn pending(&self, observer: ObserverId) -> usize {
        self.queues.get(observer.0).map(VecDeque::len).unwrap_or(0)
    }
}
