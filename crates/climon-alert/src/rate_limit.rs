use chrono::{DateTime, Duration, Utc};
use climon_common::types::AlertKind;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

type LimitKey = (String, AlertKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RateLimiterStats {
    /// Keys currently tracked.
    pub active_keys: usize,
    /// Keys with at least one send inside the window.
    pub keys_with_entries: usize,
}

/// Sliding one-hour window of accepted sends per (sensor, kind).
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    sent: HashMap<LimitKey, VecDeque<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(max_per_hour: usize) -> Self {
        Self {
            max_per_window: max_per_hour,
            window: Duration::hours(1),
            sent: HashMap::new(),
        }
    }

    /// Check and commit in one step: prune, refuse at the cap, otherwise
    /// record `now` and accept. A refusal records nothing.
    pub fn allow(&mut self, sensor_id: &str, kind: AlertKind, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.window;
        let entries = self
            .sent
            .entry((sensor_id.to_string(), kind))
            .or_default();
        prune(entries, cutoff);

        if entries.len() >= self.max_per_window {
            return false;
        }
        entries.push_back(now);
        true
    }

    /// Drop expired timestamps and keys left empty. Returns the number of
    /// keys removed.
    pub fn purge(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        let before = self.sent.len();
        self.sent.retain(|_, entries| {
            prune(entries, cutoff);
            !entries.is_empty()
        });
        before - self.sent.len()
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            active_keys: self.sent.len(),
            keys_with_entries: self.sent.values().filter(|e| !e.is_empty()).count(),
        }
    }
}

fn prune(entries: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
    while entries.front().is_some_and(|t| *t <= cutoff) {
        entries.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_at_cap_without_recording() {
        let now = Utc::now();
        let mut rl = RateLimiter::new(10);
        for i in 0..10 {
            assert!(rl.allow("a", AlertKind::TemperatureHigh, now + Duration::seconds(i)));
        }
        assert!(!rl.allow("a", AlertKind::TemperatureHigh, now + Duration::seconds(20)));
        assert!(!rl.allow("a", AlertKind::TemperatureHigh, now + Duration::seconds(30)));

        // The refusals did not extend the window: once the first accepted
        // send ages out, exactly one slot opens.
        let later = now + Duration::hours(1);
        assert!(rl.allow("a", AlertKind::TemperatureHigh, later));
        assert!(!rl.allow("a", AlertKind::TemperatureHigh, later));
    }

    #[test]
    fn keys_are_per_sensor_and_kind() {
        let now = Utc::now();
        let mut rl = RateLimiter::new(1);
        assert!(rl.allow("a", AlertKind::TemperatureHigh, now));
        assert!(!rl.allow("a", AlertKind::TemperatureHigh, now));
        assert!(rl.allow("a", AlertKind::HumidityHigh, now));
        assert!(rl.allow("b", AlertKind::TemperatureHigh, now));
        assert_eq!(rl.stats().active_keys, 3);
    }

    #[test]
    fn purge_drops_keys_with_only_expired_entries() {
        let now = Utc::now();
        let mut rl = RateLimiter::new(5);
        rl.allow("a", AlertKind::TemperatureHigh, now - Duration::minutes(90));
        rl.allow("b", AlertKind::TemperatureHigh, now - Duration::minutes(10));
        assert_eq!(rl.purge(now), 1);
        assert_eq!(
            rl.stats(),
            RateLimiterStats {
                active_keys: 1,
                keys_with_entries: 1,
            }
        );
    }
}
