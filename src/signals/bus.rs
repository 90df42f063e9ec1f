//! In-process event bus for deal writes.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which store a write went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteLeg {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DealEvent {
    /// Records in `leg` changed. `id` is `None` for bulk changes.
    RecordsChanged { id: Option<i64>, leg: WriteLeg },
    WriteSucceeded { id: i64, leg: WriteLeg },
    WriteFailed {
        id: i64,
        leg: WriteLeg,
        error: String,
    },
}

pub trait DealEventListener: Send + Sync {
    fn on_event(&self, event: &DealEvent);
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn DealEventListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn DealEventListener>) {
        self.listeners.write().push(listener);
    }

    /// Deliver `event` to every listener in subscription order.
    ///
    /// The listener list is snapshotted first, so a listener may subscribe
    /// others without deadlocking.
    pub fn publish(&self, event: DealEvent) {
        match &event {
            DealEvent::WriteFailed { id, leg, error } => {
                log::warn!("Write to {:?} store failed for deal {}: {}", leg, id, error)
            }
            other => log::debug!("Deal event: {:?}", other),
        }
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener.on_event(&event);
        }
    }
}
