use chrono::{DateTime, Duration, Utc};
use climon_common::types::TemperatureReading;
use std::collections::VecDeque;

/// Time-ordered temperature samples for one sensor, pruned by age.
#[derive(Debug, Clone)]
pub struct TemperatureHistory {
    retention: Duration,
    data: VecDeque<TemperatureReading>,
}

impl TemperatureHistory {
    pub fn new(retention_secs: u64) -> Self {
        Self {
            retention: Duration::seconds(retention_secs as i64),
            data: VecDeque::new(),
        }
    }

    /// Append a sample and drop everything at or beyond the retention horizon.
    pub fn push(&mut self, reading: TemperatureReading, now: DateTime<Utc>) {
        self.data.push_back(reading);
        self.evict(now);
    }

    pub fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        // Concurrent writers may push slightly out of order.
        self.data.retain(|r| r.timestamp > cutoff);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemperatureReading> + '_ {
        self.data.iter()
    }

    pub fn to_vec(&self) -> Vec<TemperatureReading> {
        self.data.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Spread between the hottest and coldest sample with
/// `timestamp >= now - window`.
///
/// Fewer than two qualifying samples yield `0.0`.
pub fn temperature_variation<'a, I>(readings: I, window: Duration, now: DateTime<Utc>) -> f64
where
    I: IntoIterator<Item = &'a TemperatureReading>,
{
    let cutoff = now - window;
    let mut count = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for r in readings.into_iter().filter(|r| r.timestamp >= cutoff) {
        count += 1;
        min = min.min(r.temperature);
        max = max.max(r.temperature);
    }
    if count < 2 {
        return 0.0;
    }
    max - min
}
