//! Detection rules evaluated against a single reading.
//!
//! Rules are arranged in ordered groups by [`crate::detector::ThresholdDetector`].
//! Within a group the first rule that fires wins; across groups the most
//! severe finding wins.

pub mod threshold;
pub mod variation;

use chrono::{DateTime, Utc};
use climon_common::types::{AlertEvent, AlertKind, Severity};

/// Everything a rule may look at for one reading.
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    pub sensor_id: &'a str,
    pub temperature: f64,
    pub humidity: f64,
    /// Max minus min temperature over the trend window, including this reading.
    pub variation: f64,
}

pub trait DetectionRule: Send + Sync {
    fn kind(&self) -> AlertKind;

    fn severity(&self) -> Severity;

    /// Returns a candidate alert when the rule's condition holds.
    fn evaluate(&self, sample: &Sample<'_>, now: DateTime<Utc>) -> Option<AlertEvent>;
}
