//! Authoritative sketch state plus ordered fan-out to every session.
//!
//! Uses a tokio broadcast channel for O(1) send to all subscribers; each
//! session owns an independent receiver buffering up to `capacity` lines.
//!
//! One mutex serializes everything that touches the sketch, and every
//! accepted edit is pushed into the broadcast channel *inside* that
//! critical section. That single rule yields the two ordering guarantees
//! the protocol needs:
//!
//! - all sessions observe accepted edits in one global order, and
//! - a joining session that subscribes under the same lock it snapshots
//!   under receives exactly {state at join} ∪ {every edit accepted after
//!   the join} — no gap, no duplicate, even with edits racing the join.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use scrawl_core::{Shape, Sketch};

use crate::protocol::Command;

/// Counters for monitoring hub health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Edits accepted and broadcast.
    pub commands_applied: u64,
    /// Sessions that completed a join snapshot.
    pub joins: u64,
}

/// The server's shared document state: one authoritative [`Sketch`] and
/// the broadcast channel all live sessions listen on.
pub struct SketchHub {
    sketch: Mutex<Sketch>,
    sender: broadcast::Sender<Arc<String>>,
    capacity: usize,
    commands_applied: AtomicU64,
    joins: AtomicU64,
}

impl SketchHub {
    /// Create a hub whose per-session buffer holds `capacity` lines
    /// before a slow session starts lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sketch: Mutex::new(Sketch::new()),
            sender,
            capacity,
            commands_applied: AtomicU64::new(0),
            joins: AtomicU64::new(0),
        }
    }

    /// Apply one inbound command and broadcast the accepted encoding.
    ///
    /// Returns the broadcast line, or `None` for commands a client may
    /// not send (`ADD_ID` is server-to-client only). The line is the
    /// canonical re-encoding of the parsed command, not the client's raw
    /// bytes, so whitespace quirks and unnormalized corners never reach
    /// other mirrors. Stale-target commands still broadcast: a mirror
    /// that missed nothing simply no-ops, and one that lagged converges.
    pub async fn apply(&self, cmd: Command) -> Option<Arc<String>> {
        if matches!(cmd, Command::AddWithId(..)) {
            log::warn!("hub: rejecting inbound ADD_ID (server-to-client only)");
            return None;
        }

        let mut sketch = self.sketch.lock().await;
        let line = Arc::new(cmd.encode());
        cmd.apply(&mut sketch);
        // Send while still holding the sketch lock: the channel order is
        // the acceptance order, and a concurrent join cannot slip between
        // apply and send. Zero receivers is fine.
        let _ = self.sender.send(Arc::clone(&line));
        drop(sketch);

        self.commands_applied.fetch_add(1, Ordering::Relaxed);
        Some(line)
    }

    /// Register a new session: snapshot the sketch as `ADD_ID` lines (in
    /// paint order) and subscribe to subsequent broadcasts, atomically.
    pub async fn join(&self) -> (Vec<String>, broadcast::Receiver<Arc<String>>) {
        let sketch = self.sketch.lock().await;
        let receiver = self.sender.subscribe();
        let dump = sketch
            .iter()
            .map(|(id, shape)| Command::AddWithId(id, shape.clone()).encode())
            .collect();
        drop(sketch);

        self.joins.fetch_add(1, Ordering::Relaxed);
        (dump, receiver)
    }

    /// An owned snapshot of the authoritative sketch, in paint order.
    pub async fn snapshot(&self) -> Vec<(u32, Shape)> {
        self.sketch.lock().await.snapshot()
    }

    /// Number of shapes currently in the authoritative sketch.
    pub async fn len(&self) -> usize {
        self.sketch.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sketch.lock().await.is_empty()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            commands_applied: self.commands_applied.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
        }
    }

    /// Per-session broadcast buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
