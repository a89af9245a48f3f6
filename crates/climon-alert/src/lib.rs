//! Alert detection and gating for cluster climate sensors.
//!
//! [`manager::AlertManager`] takes raw readings, validates them against the
//! sensor whitelist, updates [`registry::SensorRegistry`], asks
//! [`detector::ThresholdDetector`] for at most one candidate alert and pushes
//! it through the [`rate_limit::RateLimiter`] and [`cooldown::CooldownGate`]
//! before persisting and dispatching. Offline and back-online transitions go
//! through the same pipeline. [`scheduler::MaintenanceScheduler`] drives the
//! periodic health-check and cleanup passes.

pub mod config;
pub mod cooldown;
pub mod detector;
pub mod error;
pub mod events;
pub mod ingest;
pub mod manager;
pub mod rate_limit;
pub mod registry;
pub mod rules;
pub mod scheduler;
pub mod window;


pub use config::{AlertConfig, CooldownScope};
pub use error::IngestError;
pub use ingest::{parse_bus_message, BusMessage, RawReading, SensorWhitelist};
pub use manager::{AlertManager, AlertStatistics, Dispatch, DispatchOutcome, IngestReport};
