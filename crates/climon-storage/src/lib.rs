//! Persistence for sensor state and fired alerts.
//!
//! The alert core only talks to [`PersistenceGateway`]; the default
//! implementation ([`sqlite::SqliteStore`]) keeps everything in a single
//! SQLite database in WAL mode.

pub mod error;
pub mod sqlite;

#[cfg(test)]
mod tests;

use climon_common::types::{AlertEvent, SensorSnapshot};
pub use error::{Result, StorageError};
pub use sqlite::SqliteStore;

/// Load/save interface used by the alert manager.
///
/// Implementations must be safe to share across threads (`Send + Sync`)
/// because ingestion handlers and the health-check task call it
/// concurrently. No transactional guarantee is expected across
/// [`save_sensor_state`](Self::save_sensor_state) and
/// [`save_alert`](Self::save_alert).
pub trait PersistenceGateway: Send + Sync {
    /// Returns every persisted sensor row, most recently updated first.
    fn load_sensor_states(&self) -> Result<Vec<SensorSnapshot>>;

    /// Inserts or replaces the row for `state.sensor_id`.
    fn save_sensor_state(&self, state: &SensorSnapshot) -> Result<()>;

    /// Appends a fired alert to the history table.
    fn save_alert(&self, event: &AlertEvent) -> Result<()>;
}
