//! Single-listener event registry shared by a client and its stream tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use proto::{ChatEvent, StreamId};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Delivers "fragment received" events to at most one listener.
///
/// Clones share the same slot, so a spawned stream task always emits to
/// whichever listener is registered at the moment the fragment arrives.
#[derive(Debug, Clone, Default)]
pub struct ChatEvents {
    listener: Arc<Mutex<Option<mpsc::UnboundedSender<ChatEvent>>>>,
    next_stream: Arc<AtomicU64>,
}

impl ChatEvents {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its receiving end.
    ///
    /// Any previously registered listener is replaced; its receiver sees the
    /// channel close.
    pub fn add_listener(&self) -> mpsc::UnboundedReceiver<ChatEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let replaced = self.listener.lock().replace(tx).is_some();
        debug!(replaced, "Chat listener registered");
        rx
    }

    /// Deregisters the current listener. Returns `false` if none was registered.
    pub fn remove_listener(&self) -> bool {
        let removed = self.listener.lock().take().is_some();
        debug!(removed, "Chat listener removed");
        removed
    }

    /// Whether a listener is currently registered.
    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Sends `event` to the current listener.
    ///
    /// Returns `false` when nobody is listening; the event is dropped.
    pub fn emit(&self, event: ChatEvent) -> bool {
        let mut slot = self.listener.lock();
        let Some(tx) = slot.as_ref() else {
            trace!(stream = %event.stream_id(), "No chat listener, event dropped");
            return false;
        };
        if tx.send(event).is_err() {
            // Receiver was dropped without deregistering.
            *slot = None;
            return false;
        }
        true
    }

    /// Allocates the id for a new stream.
    pub fn next_stream_id(&self) -> StreamId {
        StreamId(self.next_stream.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
