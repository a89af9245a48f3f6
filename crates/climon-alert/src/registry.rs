use crate::window::TemperatureHistory;
use chrono::{DateTime, Duration, Utc};
use climon_common::types::{
    format_cluster_status, SensorSnapshot, SensorStatus, TemperatureReading,
};
use climon_notify::context::SensorView;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct SensorState {
    last_seen: DateTime<Utc>,
    temperature: f64,
    humidity: f64,
    status: SensorStatus,
    history: TemperatureHistory,
}

impl SensorState {
    fn snapshot(&self, sensor_id: &str) -> SensorSnapshot {
        SensorSnapshot {
            sensor_id: sensor_id.to_string(),
            last_seen: self.last_seen,
            temperature: self.temperature,
            humidity: self.humidity,
            status: self.status,
        }
    }
}

/// What an [`SensorRegistry::update`] observed, captured while the registry
/// was exclusively borrowed.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub state: SensorSnapshot,
    /// Retained history, this reading included.
    pub history: Vec<TemperatureReading>,
    /// Set when the sensor was Offline before this reading. Holds the
    /// cluster summary taken after the sensor was flipped back Online.
    pub back_online: Option<String>,
}

/// Per-sensor state and bounded temperature history.
///
/// The registry itself is not synchronized; the manager owns it behind a
/// single mutex so each operation is one critical section.
#[derive(Debug)]
pub struct SensorRegistry {
    sensors: BTreeMap<String, SensorState>,
    history_retention_secs: u64,
}

impl SensorRegistry {
    pub fn new(history_retention_secs: u64) -> Self {
        Self {
            sensors: BTreeMap::new(),
            history_retention_secs,
        }
    }

    pub fn update(
        &mut self,
        sensor_id: &str,
        temperature: f64,
        humidity: f64,
        now: DateTime<Utc>,
    ) -> UpdateOutcome {
        let retention = self.history_retention_secs;
        let state = self
            .sensors
            .entry(sensor_id.to_string())
            .or_insert_with(|| SensorState {
                last_seen: now,
                temperature,
                humidity,
                status: SensorStatus::Online,
                history: TemperatureHistory::new(retention),
            });

        let was_offline = state.status == SensorStatus::Offline;
        state.status = SensorStatus::Online;
        state.last_seen = now;
        state.temperature = temperature;
        state.humidity = humidity;
        state.history.push(TemperatureReading { temperature, timestamp: now }, now);

        let history = state.history.to_vec();
        let snapshot = state.snapshot(sensor_id);
        let back_online = was_offline.then(|| self.cluster_status());

        UpdateOutcome {
            state: snapshot,
            history,
            back_online,
        }
    }

    /// Flip every Online sensor silent for longer than `threshold_secs` to
    /// Offline. Returns only the sensors that changed.
    pub fn mark_offline_if_stale(
        &mut self,
        now: DateTime<Utc>,
        threshold_secs: u64,
    ) -> Vec<SensorSnapshot> {
        let threshold = Duration::seconds(threshold_secs as i64);
        let mut transitioned = Vec::new();
        for (id, state) in self.sensors.iter_mut() {
            if state.status == SensorStatus::Online && now - state.last_seen > threshold {
                state.status = SensorStatus::Offline;
                transitioned.push(state.snapshot(id));
            }
        }
        transitioned
    }

    /// Replace the map with persisted rows. Status is recomputed from how
    /// long ago each sensor was last seen; the stored status is ignored.
    pub fn restore(
        &mut self,
        rows: Vec<SensorSnapshot>,
        now: DateTime<Utc>,
        threshold_secs: u64,
    ) -> usize {
        let threshold = Duration::seconds(threshold_secs as i64);
        self.sensors.clear();
        for row in rows {
            let status = if now - row.last_seen > threshold {
                SensorStatus::Offline
            } else {
                SensorStatus::Online
            };
            // Rows come newest first; keep the first seen for a duplicate id.
            self.sensors.entry(row.sensor_id).or_insert(SensorState {
                last_seen: row.last_seen,
                temperature: row.temperature,
                humidity: row.humidity,
                status,
                history: TemperatureHistory::new(self.history_retention_secs),
            });
        }
        self.sensors.len()
    }

    pub fn get(&self, sensor_id: &str) -> Option<SensorSnapshot> {
        self.sensors.get(sensor_id).map(|s| s.snapshot(sensor_id))
    }

    pub fn history(&self, sensor_id: &str) -> Vec<TemperatureReading> {
        self.sensors
            .get(sensor_id)
            .map(|s| s.history.to_vec())
            .unwrap_or_default()
    }

    /// Every sensor, ordered by id.
    pub fn snapshot(&self) -> Vec<SensorSnapshot> {
        self.sensors.iter().map(|(id, s)| s.snapshot(id)).collect()
    }

    pub fn cluster_status(&self) -> String {
        format_cluster_status(&self.snapshot())
    }

    /// Sensors with their retained history, for notification context.
    pub fn views(&self) -> Vec<SensorView> {
        self.sensors
            .iter()
            .map(|(id, s)| SensorView {
                snapshot: s.snapshot(id),
                history: s.history.to_vec(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.sensors
            .values()
            .filter(|s| s.status == SensorStatus::Online)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, last_seen: DateTime<Utc>, status: SensorStatus) -> SensorSnapshot {
        SensorSnapshot {
            sensor_id: id.to_string(),
            last_seen,
            temperature: 20.0,
            humidity: 40.0,
            status,
        }
    }

    #[test]
    fn first_reading_creates_online_sensor_without_transition() {
        let now = Utc::now();
        let mut reg = SensorRegistry::new(360);
        let out = reg.update("a", 21.0, 40.0, now);
        assert_eq!(out.state.status, SensorStatus::Online);
        assert!(out.back_online.is_none());
        assert_eq!(out.history.len(), 1);
    }

    #[test]
    fn stale_check_uses_strict_threshold() {
        let now = Utc::now();
        let mut reg = SensorRegistry::new(360);
        reg.update("a", 21.0, 40.0, now);
        assert!(reg.mark_offline_if_stale(now + Duration::seconds(300), 300).is_empty());
        let flipped = reg.mark_offline_if_stale(now + Duration::seconds(301), 300);
        assert_eq!(flipped.len(), 1);
        assert_eq!(flipped[0].status, SensorStatus::Offline);
        assert_eq!(reg.online_count(), 0);
    }

    #[test]
    fn history_is_pruned_past_retention() {
        let now = Utc::now();
        let mut reg = SensorRegistry::new(360);
        for i in 0..10 {
            reg.update("a", 20.0 + i as f64, 40.0, now + Duration::seconds(i * 60));
        }
        let last = now + Duration::seconds(9 * 60);
        let history = reg.history("a");
        assert!(history.iter().all(|r| r.timestamp > last - Duration::seconds(360)));
        assert_eq!(history.len(), 6);
    }

    #[test]
    fn restore_prefers_newest_row_per_sensor() {
        let now = Utc::now();
        let mut reg = SensorRegistry::new(360);
        let restored = reg.restore(
            vec![
                row("a", now - Duration::seconds(10), SensorStatus::Offline),
                row("a", now - Duration::seconds(900), SensorStatus::Online),
            ],
            now,
            300,
        );
        assert_eq!(restored, 1);
        let a = reg.get("a").unwrap();
        assert_eq!(a.status, SensorStatus::Online);
        assert!(reg.history("a").is_empty());
    }
}
