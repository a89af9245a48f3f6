use crate::error::{Result, StorageError};
use crate::PersistenceGateway;
use chrono::{DateTime, Utc};
use climon_common::types::{AlertEvent, SensorSnapshot};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sensor_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT '{}',
    sent INTEGER NOT NULL DEFAULT 0,
    retry_count INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_alerts_sensor_time ON alerts(sensor_id, timestamp);

CREATE TABLE IF NOT EXISTS sensor_states (
    sensor_id TEXT PRIMARY KEY,
    last_seen TEXT NOT NULL,
    temperature REAL NOT NULL,
    humidity REAL NOT NULL,
    status TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`, creating parent
    /// directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::info!(path = %path.display(), "Opened alert database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection, recovering from a poisoned Mutex if necessary.
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the most recent alerts, newest first, optionally for one sensor.
    pub fn recent_alerts(&self, sensor_id: Option<&str>, limit: usize) -> Result<Vec<AlertEvent>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(
            "SELECT sensor_id, kind, severity, message, timestamp, data, sent, retry_count
             FROM alerts
             WHERE (?1 IS NULL OR sensor_id = ?1)
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![sensor_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, bool>(6)?,
                row.get::<_, u32>(7)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (sensor_id, kind, severity, message, timestamp, data, sent, retry_count) = row?;
            let data: BTreeMap<String, serde_json::Value> = serde_json::from_str(&data)?;
            events.push(AlertEvent {
                sensor_id,
                kind: kind.parse().map_err(|_| StorageError::InvalidColumn {
                    column: "kind",
                    value: kind.clone(),
                })?,
                severity: severity.parse().map_err(|_| StorageError::InvalidColumn {
                    column: "severity",
                    value: severity.clone(),
                })?,
                message,
                timestamp: parse_timestamp("timestamp", &timestamp)?,
                data,
                sent,
                retry_count,
            });
        }
        Ok(events)
    }
}

impl PersistenceGateway for SqliteStore {
    fn load_sensor_states(&self) -> Result<Vec<SensorSnapshot>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(
            "SELECT sensor_id, last_seen, temperature, humidity, status
             FROM sensor_states
             ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut states = Vec::new();
        for row in rows {
            let (sensor_id, last_seen, temperature, humidity, status) = row?;
            states.push(SensorSnapshot {
                sensor_id,
                last_seen: parse_timestamp("last_seen", &last_seen)?,
                temperature,
                humidity,
                status: status.parse().map_err(|_| StorageError::InvalidColumn {
                    column: "status",
                    value: status.clone(),
                })?,
            });
        }
        Ok(states)
    }

    fn save_sensor_state(&self, state: &SensorSnapshot) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute(
            "INSERT OR REPLACE INTO sensor_states
             (sensor_id, last_seen, temperature, humidity, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                state.sensor_id,
                state.last_seen.to_rfc3339(),
                state.temperature,
                state.humidity,
                state.status.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn save_alert(&self, event: &AlertEvent) -> Result<()> {
        let data = serde_json::to_string(&event.data)?;
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO alerts (sensor_id, kind, severity, message, timestamp, data, sent, retry_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.sensor_id,
                event.kind.as_str(),
                event.severity.to_string(),
                event.message,
                event.timestamp.to_rfc3339(),
                data,
                event.sent,
                event.retry_count,
            ],
        )?;
        Ok(())
    }
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| StorageError::InvalidTimestamp { column, source })
}
