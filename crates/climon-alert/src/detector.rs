use crate::config::AlertConfig;
use crate::rules::threshold::CompareOp::{self, AtOrAbove, AtOrBelow};
use crate::rules::threshold::{Measure, ThresholdRule};
use crate::rules::variation::VariationRule;
use crate::rules::{DetectionRule, Sample};
use crate::window::temperature_variation;
use chrono::{DateTime, Duration, Utc};
use climon_common::types::{AlertEvent, AlertKind, Severity, TemperatureReading};

/// Evaluates one reading against ordered groups of rules.
///
/// Each group behaves like an if/else-if chain: its first firing rule is the
/// group's candidate. The result is the candidate with the highest severity;
/// among equal severities the one from the earlier group wins. Group and rule
/// order are therefore observable and must not be rearranged.
pub struct ThresholdDetector {
    groups: Vec<Vec<Box<dyn DetectionRule>>>,
    trend_window: Duration,
}

impl ThresholdDetector {
    pub fn new(groups: Vec<Vec<Box<dyn DetectionRule>>>, trend_window_secs: u64) -> Self {
        Self {
            groups,
            trend_window: Duration::seconds(trend_window_secs as i64),
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        let t = &config.temperature;
        let h = &config.humidity;
        let temp = |kind, severity, op, value| threshold(kind, severity, Measure::Temperature, op, value);
        let hum = |kind, severity, op, value| threshold(kind, severity, Measure::Humidity, op, value);

        let temperature = vec![
            temp(AlertKind::TemperatureCritical, Severity::Critical, AtOrAbove, t.critical_high),
            temp(AlertKind::TemperatureHigh, Severity::High, AtOrAbove, t.high),
            temp(AlertKind::TemperatureCritical, Severity::Critical, AtOrBelow, t.critical_low),
            temp(AlertKind::TemperatureLow, Severity::High, AtOrBelow, t.low),
        ];
        let humidity = vec![
            hum(AlertKind::HumidityHigh, Severity::Medium, AtOrAbove, h.high),
            hum(AlertKind::HumidityLow, Severity::Medium, AtOrBelow, h.low),
        ];
        let variation: Vec<Box<dyn DetectionRule>> = vec![Box::new(VariationRule {
            threshold: config.variation.threshold,
        })];

        Self::new(
            vec![temperature, humidity, variation],
            config.variation.window_secs,
        )
    }

    /// `history` must already contain the current reading.
    pub fn evaluate(
        &self,
        sensor_id: &str,
        temperature: f64,
        humidity: f64,
        history: &[TemperatureReading],
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        let sample = Sample {
            sensor_id,
            temperature,
            humidity,
            variation: temperature_variation(history, self.trend_window, now),
        };

        let mut best: Option<AlertEvent> = None;
        for group in &self.groups {
            let Some(candidate) = group.iter().find_map(|rule| rule.evaluate(&sample, now)) else {
                continue;
            };
            // Strictly greater, so the earliest among equals is kept.
            if best.as_ref().map_or(true, |b| candidate.severity > b.severity) {
                best = Some(candidate);
            }
        }
        best
    }
}

fn threshold(
    kind: AlertKind,
    severity: Severity,
    measure: Measure,
    operator: CompareOp,
    value: f64,
) -> Box<dyn DetectionRule> {
    Box::new(ThresholdRule {
        kind,
        severity,
        measure,
        operator,
        value,
    })
}
