use crate::config::CooldownScope;
use chrono::{DateTime, Duration, Utc};
use climon_common::types::AlertKind;
use std::collections::HashMap;

type CooldownKey = (String, Option<AlertKind>);

/// Minimum spacing between notifications.
///
/// With [`CooldownScope::Sensor`] a send of any kind silences every kind on
/// that sensor until the cooldown elapses.
#[derive(Debug)]
pub struct CooldownGate {
    cooldown: Duration,
    scope: CooldownScope,
    last_sent: HashMap<CooldownKey, DateTime<Utc>>,
}

impl CooldownGate {
    pub fn new(cooldown_secs: u64, scope: CooldownScope) -> Self {
        Self {
            cooldown: Duration::seconds(cooldown_secs as i64),
            scope,
            last_sent: HashMap::new(),
        }
    }

    fn key(&self, sensor_id: &str, kind: AlertKind) -> CooldownKey {
        match self.scope {
            CooldownScope::Sensor => (sensor_id.to_string(), None),
            CooldownScope::SensorAndKind => (sensor_id.to_string(), Some(kind)),
        }
    }

    pub fn allow(&self, sensor_id: &str, kind: AlertKind, now: DateTime<Utc>) -> bool {
        match self.last_sent.get(&self.key(sensor_id, kind)) {
            None => true,
            Some(last) => now - *last >= self.cooldown,
        }
    }

    /// Check and record in one step. Returns `false` without touching the
    /// record when the key is still cooling down.
    pub fn try_acquire(&mut self, sensor_id: &str, kind: AlertKind, now: DateTime<Utc>) -> bool {
        if !self.allow(sensor_id, kind, now) {
            return false;
        }
        self.record(sensor_id, kind, now);
        true
    }

    pub fn record(&mut self, sensor_id: &str, kind: AlertKind, now: DateTime<Utc>) {
        let key = self.key(sensor_id, kind);
        self.last_sent.insert(key, now);
    }

    /// Forget records older than `retention_secs`. Returns how many went.
    pub fn purge(&mut self, now: DateTime<Utc>, retention_secs: u64) -> usize {
        let cutoff = now - Duration::seconds(retention_secs as i64);
        let before = self.last_sent.len();
        self.last_sent.retain(|_, last| *last > cutoff);
        before - self.last_sent.len()
    }

    pub fn len(&self) -> usize {
        self.last_sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_sent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_inclusive() {
        let now = Utc::now();
        let mut gate = CooldownGate::new(300, CooldownScope::Sensor);
        assert!(gate.allow("a", AlertKind::TemperatureHigh, now));
        gate.record("a", AlertKind::TemperatureHigh, now);
        assert!(!gate.allow("a", AlertKind::TemperatureHigh, now + Duration::seconds(299)));
        assert!(gate.allow("a", AlertKind::TemperatureHigh, now + Duration::seconds(300)));
    }

    #[test]
    fn sensor_scope_spans_kinds() {
        let now = Utc::now();
        let mut gate = CooldownGate::new(300, CooldownScope::Sensor);
        gate.record("a", AlertKind::SensorBackOnline, now);
        assert!(!gate.allow("a", AlertKind::TemperatureCritical, now));
        assert!(gate.allow("b", AlertKind::TemperatureCritical, now));
    }

    #[test]
    fn kind_scope_keeps_kinds_apart() {
        let now = Utc::now();
        let mut gate = CooldownGate::new(300, CooldownScope::SensorAndKind);
        gate.record("a", AlertKind::SensorBackOnline, now);
        assert!(gate.allow("a", AlertKind::TemperatureCritical, now));
        assert!(!gate.allow("a", AlertKind::SensorBackOnline, now));
    }

    #[test]
    fn try_acquire_claims_the_slot_once() {
        let now = Utc::now();
        let mut gate = CooldownGate::new(300, CooldownScope::Sensor);
        assert!(gate.try_acquire("a", AlertKind::TemperatureCritical, now));
        assert!(!gate.try_acquire("a", AlertKind::TemperatureVariation, now + Duration::seconds(1)));
        assert_eq!(gate.len(), 1);
        // a refused attempt must not push the window forward
        assert!(gate.try_acquire("a", AlertKind::TemperatureHigh, now + Duration::seconds(300)));
    }

    #[test]
    fn purge_respects_retention() {
        let now = Utc::now();
        let mut gate = CooldownGate::new(300, CooldownScope::Sensor);
        gate.record("a", AlertKind::TemperatureHigh, now - Duration::hours(2));
        gate.record("b", AlertKind::TemperatureHigh, now - Duration::minutes(5));
        assert_eq!(gate.purge(now, 3600), 1);
        assert_eq!(gate.len(), 1);
    }
}
