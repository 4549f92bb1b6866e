//! Live-reload subscriber registry.
//!
//! Every SSE connection owns a [`Subscription`]; dropping it (the client went
//! away) removes the connection from the registry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Per-connection buffer. Broadcasts to a full buffer are dropped.
pub const SUBSCRIBER_BUFFER: usize = 16;

/// Set of connected live-reload clients.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, mpsc::Sender<String>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new connection.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.subscribers.lock().insert(id, tx);
        tracing::debug!(subscriber = id, "live-reload client connected");

        Subscription {
            id,
            rx,
            registry: Arc::downgrade(self),
        }
    }

    /// Send `message` to every subscriber without blocking.
    ///
    /// Returns how many subscribers accepted it. Full buffers lose this
    /// message; closed channels are removed.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;

        subscribers.retain(|id, tx| match tx.try_send(message.to_string()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::debug!(subscriber = id, "subscriber buffer full, dropping message");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });

        delivered
    }

    /// Disconnect everyone. Open streams end after draining their buffers.
    pub fn close_all(&self) {
        let closed = std::mem::take(&mut *self.subscribers.lock());
        if !closed.is_empty() {
            tracing::debug!(subscribers = closed.len(), "closing live-reload clients");
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    fn remove(&self, id: u64) {
        if self.subscribers.lock().remove(&id).is_some() {
            tracing::debug!(subscriber = id, "live-reload client disconnected");
        }
    }
}

/// One connected client. Unregisters itself on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<String>,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next broadcast message, or `None` once the registry closed us.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
