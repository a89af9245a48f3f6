use super::{DetectionRule, Sample};
use crate::events;
use chrono::{DateTime, Utc};
use climon_common::types::{AlertEvent, AlertKind, Severity};

/// Fires when the temperature spread over the trend window reaches the
/// configured limit.
#[derive(Debug, Clone)]
pub struct VariationRule {
    pub threshold: f64,
}

impl DetectionRule for VariationRule {
    fn kind(&self) -> AlertKind {
        AlertKind::TemperatureVariation
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn evaluate(&self, sample: &Sample<'_>, now: DateTime<Utc>) -> Option<AlertEvent> {
        if sample.variation < self.threshold {
            return None;
        }
        Some(events::threshold_alert(
            self.kind(),
            self.severity(),
            sample,
            self.threshold,
            now,
        ))
    }
}
