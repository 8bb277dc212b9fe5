/// System performance metrics derived from the current train set
///
/// `compute` is a pure function of the events plus a pluggable throughput
/// estimator. Throughput has no real measurement source in the simulation,
/// so it stays behind the `ThroughputEstimator` trait as an explicitly
/// labeled stochastic placeholder - a real model can be substituted
/// without touching any caller.
use std::collections::VecDeque;

use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::event::TrainEvent;
use super::rng::SimRng;

/// Assumed track capacity for the utilization percentage
pub const TRACK_CAPACITY: usize = 20;

/// Rolling history length kept by the aggregator
pub const HISTORY_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub avg_delay: f64,
    /// Trains per hour. A stochastic proxy - do NOT read meaning into it
    pub throughput: f64,
    /// Percentage of track capacity in use, capped at 100
    pub utilization: f64,
}

impl SystemMetrics {
    pub fn zero() -> Self {
        SystemMetrics {
            avg_delay: 0.0,
            throughput: 0.0,
            utilization: 0.0,
        }
    }
}

/// Source of the throughput figure
pub trait ThroughputEstimator {
    fn estimate(&mut self, trains: &[TrainEvent]) -> f64;
}

/// Default estimator: uniform in 15..25 trains/hour, unrelated to the
/// train set by construction
pub struct StochasticThroughput {
    rng: SimRng,
}

impl StochasticThroughput {
    pub fn new(rng: SimRng) -> Self {
        StochasticThroughput { rng }
    }
}

impl Default for StochasticThroughput {
    fn default() -> Self {
        StochasticThroughput::new(SimRng::from_entropy())
    }
}

impl ThroughputEstimator for StochasticThroughput {
    fn estimate(&mut self, _trains: &[TrainEvent]) -> f64 {
        self.rng.0.gen_range(15.0..25.0)
    }
}

/// Compute the metric triple for the current train set
///
/// Empty input yields all zeroes rather than dividing by zero.
pub fn compute(trains: &[TrainEvent], estimator: &mut dyn ThroughputEstimator) -> SystemMetrics {
    if trains.is_empty() {
        return SystemMetrics::zero();
    }

    let total_delay: u32 = trains.iter().map(|e| e.delay_minutes).sum();
    let avg_delay = f64::from(total_delay) / trains.len() as f64;
    let utilization = (trains.len() as f64 / TRACK_CAPACITY as f64) * 100.0;

    SystemMetrics {
        avg_delay,
        throughput: estimator.estimate(trains),
        utilization: utilization.min(100.0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSample {
    pub recorded_at: DateTime<Local>,
    pub metrics: SystemMetrics,
}

/// Bounded rolling history of metric samples, oldest evicted first
pub struct MetricsAggregator {
    history: VecDeque<MetricsSample>,
    window: usize,
}

impl MetricsAggregator {
    pub fn new(window: usize) -> Self {
        MetricsAggregator {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn record(&mut self, metrics: SystemMetrics, recorded_at: DateTime<Local>) {
        self.history.push_back(MetricsSample {
            recorded_at,
            metrics,
        });
        while self.history.len() > self.window {
            self.history.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&MetricsSample> {
        self.history.back()
    }

    pub fn history(&self) -> impl Iterator<Item = &MetricsSample> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        MetricsAggregator::new(HISTORY_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::EventKind;

    struct FixedThroughput(f64);

    impl ThroughputEstimator for FixedThroughput {
        fn estimate(&mut self, _trains: &[TrainEvent]) -> f64 {
            self.0
        }
    }

    fn event(id: &str, delay: u32) -> TrainEvent {
        TrainEvent {
            train_id: id.to_string(),
            train_name: format!("Train {}", id),
            kind: EventKind::Arrival,
            route: "East".to_string(),
            priority_class: 2,
            delay_minutes: delay,
            scheduled_time: 10,
            generated_at: Local::now(),
        }
    }

    #[test]
    fn empty_train_set_yields_zero_metrics() {
        let mut estimator = FixedThroughput(99.0);
        assert_eq!(compute(&[], &mut estimator), SystemMetrics::zero());
    }

    #[test]
    fn avg_delay_and_utilization_follow_the_train_set() {
        let trains = vec![event("A", 10), event("B", 0), event("C", 20)];
        let mut estimator = FixedThroughput(18.5);
        let metrics = compute(&trains, &mut estimator);
        assert_eq!(metrics.avg_delay, 10.0);
        assert_eq!(metrics.throughput, 18.5);
        assert_eq!(metrics.utilization, 15.0);
    }

    #[test]
    fn utilization_is_capped_at_one_hundred() {
        let trains: Vec<TrainEvent> = (0..TRACK_CAPACITY + 10)
            .map(|i| event(&format!("T{}", i), 0))
            .collect();
        let mut estimator = FixedThroughput(20.0);
        let metrics = compute(&trains, &mut estimator);
        assert_eq!(metrics.utilization, 100.0);
    }

    #[test]
    fn stochastic_throughput_stays_in_range() {
        let mut estimator = StochasticThroughput::new(SimRng::from_seed_u64(11));
        for _ in 0..50 {
            let value = estimator.estimate(&[]);
            assert!((15.0..25.0).contains(&value));
        }
    }

    #[test]
    fn rolling_window_evicts_oldest_first() {
        let mut aggregator = MetricsAggregator::new(HISTORY_WINDOW);
        let now = Local::now();
        for i in 0..25 {
            let metrics = SystemMetrics {
                avg_delay: f64::from(i),
                throughput: 20.0,
                utilization: 50.0,
            };
            aggregator.record(metrics, now);
        }

        assert_eq!(aggregator.len(), HISTORY_WINDOW);
        let delays: Vec<f64> = aggregator.history().map(|s| s.metrics.avg_delay).collect();
        let expected: Vec<f64> = (5..25).map(f64::from).collect();
        assert_eq!(delays, expected);
        assert_eq!(aggregator.latest().unwrap().metrics.avg_delay, 24.0);
    }
}
