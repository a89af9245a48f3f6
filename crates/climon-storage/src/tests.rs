use crate::sqlite::SqliteStore;
use crate::PersistenceGateway;
use chrono::{Duration, TimeZone, Utc};
use climon_common::types::{AlertEvent, AlertKind, SensorSnapshot, SensorStatus, Severity};
use tempfile::TempDir;

fn setup() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(&dir.path().join("data").join("alerts.db")).unwrap();
    (dir, store)
}

fn snapshot(sensor: &str, status: SensorStatus, temperature: f64) -> SensorSnapshot {
    SensorSnapshot {
        sensor_id: sensor.to_string(),
        last_seen: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        temperature,
        humidity: 48.5,
        status,
    }
}

#[test]
fn empty_database_loads_no_states() {
    let (_dir, store) = setup();
    assert!(store.load_sensor_states().unwrap().is_empty());
}

#[test]
fn sensor_state_round_trips_through_sqlite() {
    let (_dir, store) = setup();
    let state = snapshot("a", SensorStatus::Offline, 23.4);
    store.save_sensor_state(&state).unwrap();

    let loaded = store.load_sensor_states().unwrap();
    assert_eq!(loaded, vec![state]);
}

#[test]
fn saving_same_sensor_replaces_row() {
    let (_dir, store) = setup();
    store
        .save_sensor_state(&snapshot("a", SensorStatus::Online, 20.0))
        .unwrap();
    store
        .save_sensor_state(&snapshot("a", SensorStatus::Offline, 21.0))
        .unwrap();

    let loaded = store.load_sensor_states().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].temperature, 21.0);
    assert_eq!(loaded[0].status, SensorStatus::Offline);
}

#[test]
fn alerts_are_listed_newest_first_and_filtered_by_sensor() {
    let store = SqliteStore::open_in_memory().unwrap();
    let now = Utc::now();

    let first = AlertEvent::new(
        "a",
        AlertKind::TemperatureHigh,
        Severity::High,
        "first".into(),
        now - Duration::seconds(30),
    )
    .with_data("title", "High temperature detected by sensor a")
    .with_data("temperature", 28.0);
    let second = AlertEvent::new(
        "b",
        AlertKind::HumidityLow,
        Severity::Medium,
        "second".into(),
        now,
    );
    store.save_alert(&first).unwrap();
    store.save_alert(&second).unwrap();

    let all = store.recent_alerts(None, 10).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].message, "second");
    assert_eq!(all[1].kind, AlertKind::TemperatureHigh);
    assert_eq!(all[1].data["temperature"], 28.0);
    assert_eq!(all[1].title(), "High temperature detected by sensor a");

    let only_a = store.recent_alerts(Some("a"), 10).unwrap();
    assert_eq!(only_a.len(), 1);
    assert_eq!(only_a[0].severity, Severity::High);
    assert!(!only_a[0].sent);
}

#[test]
fn reopening_keeps_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("alerts.db");
    {
        let store = SqliteStore::open(&path).unwrap();
        store
            .save_sensor_state(&snapshot("b", SensorStatus::Online, 25.0))
            .unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    let loaded = store.load_sensor_states().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].sensor_id, "b");
}
