//! Shared state for the web surface.
//!
//! The tick loop publishes snapshots through a [`StateUpdater`]; the HTTP
//! and WebSocket handlers read them from [`SharedState`].

use crate::ClockMetrics;
use clock_common::snapshot::{ClockSnapshot, CommandKind};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Update message for WebSocket broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateUpdate {
    /// A newly published snapshot.
    #[serde(rename = "snapshot")]
    Snapshot(ClockSnapshot),
    /// A command was accepted into the mailbox.
    #[serde(rename = "command")]
    CommandQueued {
        /// Command kind.
        kind: String,
    },
}

/// Shared state container.
#[derive(Debug, Default)]
pub struct SharedState {
    /// Latest published snapshot; `None` until the first publish.
    pub latest: RwLock<Option<ClockSnapshot>>,
    /// Number of snapshots published.
    pub publish_count: AtomicU64,
}

impl SharedState {
    /// Latest snapshot, or the all-zero default if nothing was published yet.
    pub fn snapshot(&self) -> ClockSnapshot {
        self.latest
            .read()
            .ok()
            .and_then(|guard| *guard)
            .unwrap_or_default()
    }

    /// Whether at least one snapshot has been published.
    pub fn has_published(&self) -> bool {
        self.publish_count.load(Ordering::Relaxed) > 0
    }
}

/// Handle for publishing state from the tick loop.
#[derive(Clone)]
pub struct StateUpdater {
    pub(crate) state: Arc<SharedState>,
    pub(crate) broadcast_tx: broadcast::Sender<StateUpdate>,
    pub(crate) metrics: Option<Arc<ClockMetrics>>,
}

impl StateUpdater {
    /// Create an updater over `state`, without metrics.
    pub fn new(state: Arc<SharedState>, broadcast_tx: broadcast::Sender<StateUpdate>) -> Self {
        Self {
            state,
            broadcast_tx,
            metrics: None,
        }
    }

    /// Publish a snapshot to HTTP readers and WebSocket clients.
    pub fn publish(&self, snapshot: ClockSnapshot) {
        if let Ok(mut guard) = self.state.latest.write() {
            *guard = Some(snapshot);
        }
        self.state.publish_count.fetch_add(1, Ordering::Relaxed);
        let _ = self.broadcast_tx.send(StateUpdate::Snapshot(snapshot));

        if let Some(ref metrics) = self.metrics {
            metrics.update_from_snapshot(&snapshot);
        }
    }

    /// Record a completed tick.
    pub fn record_tick(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_tick();
        }
    }

    /// Record the outcome of applying a command in the tick loop.
    pub fn record_command(&self, kind: CommandKind, applied: bool) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_command(kind, applied);
        }
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> ClockSnapshot {
        self.state.snapshot()
    }
}
