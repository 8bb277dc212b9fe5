/// The model module contains all core simulation structures
pub mod event;
pub mod fleet;
pub mod metrics;
pub mod producer;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
