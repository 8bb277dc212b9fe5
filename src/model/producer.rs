/// The producer cadence: tick the fleet, rank the arrivals, publish
///
/// Runs on a dedicated thread, decoupled from the dashboard's refresh
/// loop. Each pass drains pending operator interventions, builds one
/// complete snapshot and publishes it to the store, then persists the
/// same snapshot for out-of-process consumers. A failed state-file write
/// is logged and retried on the next tick; nothing here crashes the loop.
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};

use super::fleet::{Fleet, Intervention};
use super::scheduler::rank_arrivals;
use super::snapshot::{write_state_file, Snapshot, SnapshotStore};
use crate::logger::Logger;

pub struct ProducerSettings {
    pub tick_interval: Duration,
    pub recommendation_limit: usize,
    /// `None` disables persistence
    pub state_file: Option<PathBuf>,
}

/// Build the snapshot for one tick
///
/// Departures stay in `active_trains` for display but only the tick's
/// arrivals are handed to the scheduler.
pub fn build_snapshot(fleet: &mut Fleet, limit: usize, now: DateTime<Local>) -> Snapshot {
    let report = fleet.tick(now);
    let arrivals: Vec<_> = report
        .events
        .iter()
        .filter(|e| e.is_arrival())
        .cloned()
        .collect();
    let recommendations = rank_arrivals(&arrivals, limit);

    Snapshot {
        active_trains: report.events,
        recommendations,
        track_status: report.track_status,
    }
}

/// Run the producer loop until the intervention channel disconnects
///
/// The channel doubles as the shutdown signal: when the dashboard drops
/// its sender, the loop returns after the current pass.
pub fn run_producer(
    mut fleet: Fleet,
    store: Arc<SnapshotStore>,
    interventions: Receiver<Intervention>,
    logger: Arc<Logger>,
    settings: ProducerSettings,
) {
    logger.info("Producer loop started");
    loop {
        loop {
            match interventions.try_recv() {
                Ok(intervention) => {
                    if let Some(description) = fleet.apply(intervention) {
                        logger.info(&description);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    logger.info("Dashboard gone - producer loop stopping");
                    return;
                }
            }
        }

        let snapshot = Arc::new(build_snapshot(
            &mut fleet,
            settings.recommendation_limit,
            Local::now(),
        ));
        store.publish(snapshot.clone());

        if let Some(path) = &settings.state_file {
            if let Err(err) = write_state_file(&snapshot, path) {
                logger.warning(&format!(
                    "Failed to write state file {}: {} (will retry next tick)",
                    path.display(),
                    err
                ));
            }
        }

        logger.debug(&format!(
            "Published snapshot: {} events, {} recommendations",
            snapshot.active_trains.len(),
            snapshot.recommendations.len()
        ));

        thread::sleep(settings.tick_interval);
    }
}
