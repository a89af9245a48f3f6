use super::{DetectionRule, Sample};
use crate::events;
use chrono::{DateTime, Utc};
use climon_common::types::{AlertEvent, AlertKind, Severity};
use std::str::FromStr;

/// Comparison applied between a measured value and a threshold. Boundaries
/// are inclusive on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    AtOrAbove,
    AtOrBelow,
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater_equal" | "gte" => Ok(Self::AtOrAbove),
            "less_equal" | "lte" => Ok(Self::AtOrBelow),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtOrAbove => write!(f, "greater_equal"),
            Self::AtOrBelow => write!(f, "less_equal"),
        }
    }
}

impl CompareOp {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::AtOrAbove => value >= threshold,
            Self::AtOrBelow => value <= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Temperature,
    Humidity,
}

impl Measure {
    fn read(&self, sample: &Sample<'_>) -> f64 {
        match self {
            Measure::Temperature => sample.temperature,
            Measure::Humidity => sample.humidity,
        }
    }
}

/// Fires when the current temperature or humidity crosses a fixed bound.
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    pub kind: AlertKind,
    pub severity: Severity,
    pub measure: Measure,
    pub operator: CompareOp,
    pub value: f64,
}

impl DetectionRule for ThresholdRule {
    fn kind(&self) -> AlertKind {
        self.kind
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn evaluate(&self, sample: &Sample<'_>, now: DateTime<Utc>) -> Option<AlertEvent> {
        if !self.operator.check(self.measure.read(sample), self.value) {
            return None;
        }
        Some(events::threshold_alert(
            self.kind,
            self.severity,
            sample,
            self.value,
            now,
        ))
    }
}
