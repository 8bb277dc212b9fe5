/// Train events are the unit of work in the simulation
///
/// Key concepts:
/// - EventKind: whether a train is arriving or departing this tick
/// - TrainEvent: one observation of one train, produced fresh every tick
///
/// Events never survive across ticks. The fleet emits exactly one event
/// per tracked train per tick, and the next tick supersedes all of them
/// wholesale. A `train_id` together with `generated_at` identifies an
/// event uniquely.
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// What a train is doing this tick
///
/// Only arrivals are eligible for ranking; departures are recorded in the
/// snapshot for display but never scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Arrival,
    Departure,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Arrival => "Arrival",
            EventKind::Departure => "Departure",
        }
    }
}

/// One observation of one train during one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainEvent {
    /// Stable identifier, unique within the fleet
    pub train_id: String,
    /// Display label; maps to a priority class via the fleet's lookup table
    pub train_name: String,
    pub kind: EventKind,
    /// Direction/region label. Informational only, never used in ranking
    pub route: String,
    /// Higher = more important (flagship trains beat locals); static per name
    pub priority_class: u8,
    /// Sampled fresh each tick; not cumulative in the scheduler's view
    pub delay_minutes: u32,
    /// Abstract position in the day, used only as a tie-break
    pub scheduled_time: u32,
    pub generated_at: DateTime<Local>,
}

impl TrainEvent {
    pub fn is_arrival(&self) -> bool {
        self.kind == EventKind::Arrival
    }
}

/// Derived per-train status shown on the track status panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    #[serde(rename = "On Time")]
    OnTime,
    Delayed,
    /// Broken down and held at a station
    Waiting,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::OnTime => "On Time",
            TrackStatus::Delayed => "Delayed",
            TrackStatus::Waiting => "Waiting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(kind: EventKind) -> TrainEvent {
        TrainEvent {
            train_id: "12951".to_string(),
            train_name: "Mumbai Rajdhani Express".to_string(),
            kind,
            route: "North".to_string(),
            priority_class: 3,
            delay_minutes: 10,
            scheduled_time: 42,
            generated_at: Local::now(),
        }
    }

    #[test]
    fn arrivals_are_eligible() {
        assert!(sample_event(EventKind::Arrival).is_arrival());
        assert!(!sample_event(EventKind::Departure).is_arrival());
    }

    #[test]
    fn track_status_serializes_as_display_labels() {
        assert_eq!(
            serde_json::to_string(&TrackStatus::OnTime).unwrap(),
            "\"On Time\""
        );
        assert_eq!(
            serde_json::to_string(&TrackStatus::Delayed).unwrap(),
            "\"Delayed\""
        );
        assert_eq!(
            serde_json::to_string(&TrackStatus::Waiting).unwrap(),
            "\"Waiting\""
        );
    }

    #[test]
    fn event_round_trips_through_json() {
        let event = sample_event(EventKind::Arrival);
        let json = serde_json::to_string(&event).unwrap();
        let back: TrainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
