/// Shared state between the producer loop and the dashboard
///
/// The producer publishes one complete `Snapshot` per tick; the dashboard
/// reads it on its own cadence. The two sides are decoupled: the reader
/// may see the same snapshot several times or miss intermediate ones, but
/// it can never see a partially updated one - `publish` swaps a whole
/// `Arc<Snapshot>` behind the lock, there is no in-place mutation.
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::event::{TrackStatus, TrainEvent};
use super::scheduler::RecommendationBatch;

/// The complete published state for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every event of the tick, arrivals and departures alike
    pub active_trains: Vec<TrainEvent>,
    pub recommendations: RecommendationBatch,
    pub track_status: BTreeMap<String, TrackStatus>,
}

/// Single-writer / many-reader holder for the latest snapshot
pub struct SnapshotStore {
    latest: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore {
            latest: RwLock::new(None),
        }
    }

    /// Atomically replace the last-visible snapshot
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        if let Ok(mut guard) = self.latest.write() {
            *guard = Some(snapshot);
        }
    }

    /// Latest complete snapshot, or `None` before the first publish
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().ok().and_then(|guard| guard.clone())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        SnapshotStore::new()
    }
}

/// Persist the snapshot wholesale as pretty JSON
///
/// Written once per tick for out-of-process consumers. A failed write is
/// non-fatal for the producer: it logs a warning and tries again next tick.
pub fn write_state_file(snapshot: &Snapshot, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)
}
