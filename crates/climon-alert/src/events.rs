//! Construction of [`AlertEvent`]s with formatted title, message and
//! kind-specific context in the attribute map.

use crate::rules::Sample;
use chrono::{DateTime, Utc};
use climon_common::messages::{render, template};
use climon_common::types::{AlertEvent, AlertKind, Severity};

fn one_decimal(v: f64) -> String {
    format!("{v:.1}")
}

fn build(
    sensor_id: &str,
    kind: AlertKind,
    severity: Severity,
    vars: &[(&str, String)],
    now: DateTime<Utc>,
) -> AlertEvent {
    let tmpl = template(kind);
    AlertEvent::new(sensor_id, kind, severity, render(tmpl.body, vars), now)
        .with_data("title", render(tmpl.title, vars))
}

/// Alert for a breached temperature, humidity or variation bound.
/// `threshold` is the bound that was actually crossed.
pub fn threshold_alert(
    kind: AlertKind,
    severity: Severity,
    sample: &Sample<'_>,
    threshold: f64,
    now: DateTime<Utc>,
) -> AlertEvent {
    let vars = [
        ("sensor", sample.sensor_id.to_string()),
        ("temperature", one_decimal(sample.temperature)),
        ("humidity", one_decimal(sample.humidity)),
        ("variation", one_decimal(sample.variation)),
        ("threshold", one_decimal(threshold)),
    ];
    let event = build(sample.sensor_id, kind, severity, &vars, now)
        .with_data("temperature", sample.temperature)
        .with_data("humidity", sample.humidity)
        .with_data("threshold", threshold);
    if kind == AlertKind::TemperatureVariation {
        event.with_data("variation", sample.variation)
    } else {
        event
    }
}

pub fn offline_alert(sensor_id: &str, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> AlertEvent {
    let last_seen_text = last_seen.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let vars = [
        ("sensor", sensor_id.to_string()),
        ("last_seen", last_seen_text),
    ];
    build(sensor_id, AlertKind::SensorOffline, Severity::High, &vars, now)
        .with_data("last_seen", last_seen.to_rfc3339())
}

/// `sensors_status` is the cluster summary captured when the sensor came back.
pub fn back_online_alert(
    sensor_id: &str,
    temperature: f64,
    sensors_status: &str,
    now: DateTime<Utc>,
) -> AlertEvent {
    let vars = [
        ("sensor", sensor_id.to_string()),
        ("temperature", one_decimal(temperature)),
        ("sensors_status", sensors_status.to_string()),
    ];
    build(sensor_id, AlertKind::SensorBackOnline, Severity::Low, &vars, now)
        .with_data("temperature", temperature)
        .with_data("sensors_status", sensors_status)
}
