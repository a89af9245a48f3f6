use chrono::{DateTime, Duration, Utc};
use climon_common::types::{AlertKind, SensorSnapshot, TemperatureReading};
use serde::{Deserialize, Serialize};

/// One sensor as seen at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorView {
    #[serde(flatten)]
    pub snapshot: SensorSnapshot,
    pub history: Vec<TemperatureReading>,
}

/// Everything a channel may need besides the alert itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationContext {
    pub generated_at: DateTime<Utc>,
    /// How far back a rendered chart should reach for this alert kind.
    pub chart_window_minutes: u32,
    pub sensors: Vec<SensorView>,
}

impl NotificationContext {
    pub fn new(kind: AlertKind, sensors: Vec<SensorView>, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            chart_window_minutes: kind.chart_window_minutes(),
            sensors,
        }
    }

    /// Per-sensor temperature series inside the chart window. Sensors with
    /// fewer than two points are skipped since they cannot draw a line.
    pub fn chart_series(&self) -> Vec<(&str, Vec<TemperatureReading>)> {
        let cutoff = self.generated_at - Duration::minutes(i64::from(self.chart_window_minutes));
        self.sensors
            .iter()
            .filter_map(|view| {
                let points: Vec<TemperatureReading> = view
                    .history
                    .iter()
                    .filter(|r| r.timestamp >= cutoff)
                    .copied()
                    .collect();
                (points.len() >= 2).then_some((view.snapshot.sensor_id.as_str(), points))
            })
            .collect()
    }
}
