//! Live connection registry and event fan-out
//!
//! Each registered connection is represented by the sending half of an
//! unbounded channel. The socket task owns the receiving half; once it goes
//! away the next send fails and the connection is dropped from the registry.

use super::db::StoryStore;
use super::error::StorageError;
use super::types::LiveEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Window reported in the initial snapshot
pub const SNAPSHOT_WINDOW: Duration = Duration::from_secs(5 * 60);

pub type ConnectionId = u64;
pub type EventSender = mpsc::UnboundedSender<LiveEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<LiveEvent>;

pub struct Notifier {
    store: Arc<dyn StoryStore>,
    next_id: AtomicU64,
    connections: Mutex<HashMap<ConnectionId, EventSender>>,
}

impl Notifier {
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self {
            store,
            next_id: AtomicU64::new(1),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a connection and send it the initial snapshot
    ///
    /// The snapshot goes out before the connection joins the live set, so a
    /// client always sees `initial` before any `update`. If the client is
    /// already gone by then it is never added.
    pub async fn register(&self, tx: EventSender) -> Result<ConnectionId, StorageError> {
        let count = self.store.count_since(SNAPSHOT_WINDOW).await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if tx.send(LiveEvent::Initial { count }).is_err() {
            log::debug!("🔌 Connection {} closed before registration", id);
            return Ok(id);
        }

        if let Ok(mut connections) = self.connections.lock() {
            connections.insert(id, tx);
            log::info!(
                "🔌 Connection {} registered ({} live, {} recent stories)",
                id,
                connections.len(),
                count
            );
        }
        Ok(id)
    }

    /// Remove a connection; unknown ids are ignored
    pub fn unregister(&self, id: ConnectionId) {
        if let Ok(mut connections) = self.connections.lock() {
            if connections.remove(&id).is_some() {
                log::info!("🔌 Connection {} closed ({} live)", id, connections.len());
            }
        }
    }

    /// Send `event` to every live connection
    ///
    /// Iterates over a snapshot of the registry; connections whose send fails
    /// are removed afterwards. Returns the number of successful deliveries.
    pub fn broadcast(&self, event: &LiveEvent) -> usize {
        let snapshot: Vec<(ConnectionId, EventSender)> = match self.connections.lock() {
            Ok(connections) => connections
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect(),
            Err(_) => return 0,
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in snapshot {
            match tx.send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => closed.push(id),
            }
        }

        if !closed.is_empty() {
            if let Ok(mut connections) = self.connections.lock() {
                for id in &closed {
                    connections.remove(id);
                }
            }
            log::debug!("🧹 Dropped {} closed connections", closed.len());
        }

        delivered
    }

    pub fn live_connections(&self) -> usize {
        self.connections.lock().map(|c| c.len()).unwrap_or(0)
    }
}
