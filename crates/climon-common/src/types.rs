use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use climon_common::types::Severity;
///
/// let sev: Severity = "high".parse().unwrap();
/// assert_eq!(sev, Severity::High);
/// assert_eq!(sev.to_string(), "HIGH");
/// assert!(Severity::Critical > Severity::Medium);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// What an alert is about. The string form is the stable identifier used in
/// storage and in rate-limit keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    TemperatureHigh,
    TemperatureCritical,
    TemperatureLow,
    HumidityHigh,
    HumidityLow,
    TemperatureVariation,
    SensorOffline,
    SensorBackOnline,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::TemperatureHigh => "temperature_high",
            AlertKind::TemperatureCritical => "temperature_critical",
            AlertKind::TemperatureLow => "temperature_low",
            AlertKind::HumidityHigh => "humidity_high",
            AlertKind::HumidityLow => "humidity_low",
            AlertKind::TemperatureVariation => "temperature_variation",
            AlertKind::SensorOffline => "sensor_offline",
            AlertKind::SensorBackOnline => "sensor_back_online",
        }
    }

    /// Minutes of temperature history a channel should plot alongside this
    /// kind of alert.
    pub fn chart_window_minutes(&self) -> u32 {
        match self {
            AlertKind::TemperatureVariation => 15,
            AlertKind::SensorOffline => 30,
            _ => 10,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature_high" => Ok(AlertKind::TemperatureHigh),
            "temperature_critical" => Ok(AlertKind::TemperatureCritical),
            "temperature_low" => Ok(AlertKind::TemperatureLow),
            "humidity_high" => Ok(AlertKind::HumidityHigh),
            "humidity_low" => Ok(AlertKind::HumidityLow),
            "temperature_variation" => Ok(AlertKind::TemperatureVariation),
            "sensor_offline" => Ok(AlertKind::SensorOffline),
            "sensor_back_online" => Ok(AlertKind::SensorBackOnline),
            _ => Err(format!("unknown alert kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Online,
    Offline,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Online => "online",
            SensorStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SensorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(SensorStatus::Online),
            "offline" => Ok(SensorStatus::Offline),
            _ => Err(format!("unknown sensor status: {s}")),
        }
    }
}

/// A single temperature sample kept in a sensor's trend history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

/// The persisted shape of a sensor's state. History is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub sensor_id: String,
    pub last_seen: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub status: SensorStatus,
}

/// A validated reading from a whitelisted sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub sensor_id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Formatted title under `"title"` plus kind-specific context
    /// (temperature, humidity, threshold, variation, last_seen, sensors_status).
    pub data: BTreeMap<String, Value>,
    pub sent: bool,
    /// Bumped on each failed dispatch. Nothing re-sends based on it.
    pub retry_count: u32,
}

impl AlertEvent {
    pub fn new(
        sensor_id: &str,
        kind: AlertKind,
        severity: Severity,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            kind,
            severity,
            message,
            timestamp,
            data: BTreeMap::new(),
            sent: false,
            retry_count: 0,
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// The formatted title, falling back to `"<SEVERITY>: <sensor>"`.
    pub fn title(&self) -> String {
        self.data
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}: {}", self.severity, self.sensor_id))
    }
}

/// Render a one-line status summary of every sensor, e.g.
/// `"[online] Sensor a: 22.0°C, 45.0% | [offline] Sensor b: 19.5°C, 50.0%"`.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use climon_common::types::{format_cluster_status, SensorSnapshot, SensorStatus};
///
/// assert_eq!(format_cluster_status(&[]), "No sensors registered");
///
/// let s = SensorSnapshot {
///     sensor_id: "a".into(),
///     last_seen: Utc::now(),
///     temperature: 22.0,
///     humidity: 45.0,
///     status: SensorStatus::Online,
/// };
/// assert_eq!(format_cluster_status(&[s]), "[online] Sensor a: 22.0°C, 45.0%");
/// ```
pub fn format_cluster_status(sensors: &[SensorSnapshot]) -> String {
    if sensors.is_empty() {
        return "No sensors registered".to_string();
    }
    sensors
        .iter()
        .map(|s| {
            format!(
                "[{}] Sensor {}: {:.1}°C, {:.1}%",
                s.status, s.sensor_id, s.temperature, s.humidity
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
