/// Arrival ranking - the decision logic of the dashboard
///
/// Given the arrivals generated in one tick, produce an ordered short-list
/// of at most `limit` trains the operator should act on right now.
///
/// The ranking is a strict composite key:
/// 1. `priority_class` descending - flagship trains first
/// 2. `delay_minutes` descending - under equal priority, surface the worst
///    disruption first
/// 3. `scheduled_time` ascending - first come, first served among
///    operationally equal arrivals
/// 4. `train_id` ascending - final tie-break, so identical inputs always
///    produce identical output instead of whatever the sort happens to do
///    with equal keys
///
/// `rank_arrivals` is a pure function: no mutation of its input, no I/O,
/// and the output is independent of the input order.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::event::TrainEvent;

/// Maximum recommendations per tick unless the config overrides it
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;

/// One ranked entry of a recommendation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based position in the batch
    pub rank: usize,
    pub event: TrainEvent,
}

/// Ordered output of one scheduling pass, most urgent first
///
/// Immutable once produced; each tick's batch wholesale replaces the
/// previous one, there is no incremental merge across ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationBatch {
    pub entries: Vec<Recommendation>,
}

impl RecommendationBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&Recommendation> {
        self.entries.first()
    }
}

/// Compare two events by the composite urgency key
///
/// `Ordering::Less` means `a` ranks before `b`.
pub fn urgency_order(a: &TrainEvent, b: &TrainEvent) -> Ordering {
    b.priority_class
        .cmp(&a.priority_class)
        .then_with(|| b.delay_minutes.cmp(&a.delay_minutes))
        .then_with(|| a.scheduled_time.cmp(&b.scheduled_time))
        .then_with(|| a.train_id.cmp(&b.train_id))
}

/// Rank one tick's arrivals and truncate to `limit` entries
///
/// The caller filters departures out first. Empty input yields an empty
/// batch rather than an error, and fewer than `limit` arrivals yield all
/// of them, still ordered - padding up to the limit is a presentation
/// concern, not part of this contract.
pub fn rank_arrivals(arrivals: &[TrainEvent], limit: usize) -> RecommendationBatch {
    let mut ordered: Vec<&TrainEvent> = arrivals.iter().collect();
    ordered.sort_by(|a, b| urgency_order(a, b));

    let entries = ordered
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, event)| Recommendation {
            rank: idx + 1,
            event: event.clone(),
        })
        .collect();

    RecommendationBatch { entries }
}
