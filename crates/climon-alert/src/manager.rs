use crate::config::AlertConfig;
use crate::cooldown::CooldownGate;
use crate::detector::ThresholdDetector;
use crate::error::IngestError;
use crate::events;
use crate::ingest::{RawReading, SensorWhitelist};
use crate::rate_limit::{RateLimiter, RateLimiterStats};
use crate::registry::SensorRegistry;
use chrono::{DateTime, Utc};
use climon_common::types::{AlertEvent, AlertKind, SensorSnapshot};
use climon_notify::{NotificationChannel, NotificationContext};
use climon_storage::PersistenceGateway;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// What happened to an alert once it reached the gating pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    RateLimited,
    CoolingDown,
    Sent,
    SendFailed,
    /// Passed gating and was stored, but no channel takes its severity.
    Unrouted,
}

impl DispatchOutcome {
    pub fn is_gated(&self) -> bool {
        matches!(self, Self::RateLimited | Self::CoolingDown)
    }
}

#[derive(Debug, Clone)]
pub struct Dispatch {
    pub event: AlertEvent,
    pub outcome: DispatchOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub state: Option<SensorSnapshot>,
    pub back_online: Option<Dispatch>,
    pub alert: Option<Dispatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CleanupReport {
    pub rate_limit_keys_removed: usize,
    pub cooldown_records_removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertStatistics {
    pub total_sensors: usize,
    pub online_sensors: usize,
    pub cooldown_records: usize,
    pub rate_limiter: RateLimiterStats,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Orchestrates validation, state tracking, detection, gating, persistence
/// and dispatch.
///
/// Each shared structure sits behind its own mutex. Locks are taken for one
/// operation at a time and always released before any store or channel call.
pub struct AlertManager {
    config: AlertConfig,
    whitelist: SensorWhitelist,
    detector: ThresholdDetector,
    registry: Mutex<SensorRegistry>,
    rate_limiter: Mutex<RateLimiter>,
    cooldown: Mutex<CooldownGate>,
    store: Arc<dyn PersistenceGateway>,
    channel: Arc<dyn NotificationChannel>,
}

impl AlertManager {
    pub fn new(
        config: AlertConfig,
        store: Arc<dyn PersistenceGateway>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            whitelist: SensorWhitelist::new(config.sensors.iter().cloned()),
            detector: ThresholdDetector::from_config(&config),
            registry: Mutex::new(SensorRegistry::new(config.variation.history_retention_secs)),
            rate_limiter: Mutex::new(RateLimiter::new(config.max_alerts_per_hour)),
            cooldown: Mutex::new(CooldownGate::new(config.cooldown_secs, config.cooldown_scope)),
            config,
            store,
            channel,
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn whitelist(&self) -> &SensorWhitelist {
        &self.whitelist
    }

    /// Rebuild sensor state from the store. A load failure leaves the
    /// registry empty and is not fatal.
    pub fn restore(&self, now: DateTime<Utc>) -> usize {
        let rows = match self.store.load_sensor_states() {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load persisted sensor states");
                return 0;
            }
        };
        let restored = lock(&self.registry).restore(rows, now, self.config.offline_threshold_secs);
        tracing::info!(sensors = restored, "Sensor states restored");
        restored
    }

    pub async fn ingest(
        &self,
        raw: RawReading,
        now: DateTime<Utc>,
    ) -> Result<IngestReport, IngestError> {
        let reading = self.whitelist.validate(raw).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected sensor reading");
        })?;

        let outcome = lock(&self.registry).update(
            &reading.sensor_id,
            reading.temperature,
            reading.humidity,
            now,
        );
        tracing::debug!(
            sensor_id = %reading.sensor_id,
            temperature = reading.temperature,
            humidity = reading.humidity,
            history = outcome.history.len(),
            "Sensor reading recorded"
        );

        if let Err(e) = self.store.save_sensor_state(&outcome.state) {
            tracing::error!(sensor_id = %reading.sensor_id, error = %e, "Failed to save sensor state");
        }

        let mut report = IngestReport {
            state: Some(outcome.state),
            ..Default::default()
        };

        if let Some(sensors_status) = outcome.back_online {
            tracing::info!(sensor_id = %reading.sensor_id, "Sensor back online");
            let event = events::back_online_alert(
                &reading.sensor_id,
                reading.temperature,
                &sensors_status,
                now,
            );
            report.back_online = Some(self.handle_alert(event, now).await);
        }

        if let Some(event) = self.detector.evaluate(
            &reading.sensor_id,
            reading.temperature,
            reading.humidity,
            &outcome.history,
            now,
        ) {
            report.alert = Some(self.handle_alert(event, now).await);
        }

        Ok(report)
    }

    /// Flag sensors that stopped reporting and alert once per transition.
    pub async fn check_sensor_health(&self, now: DateTime<Utc>) -> Vec<Dispatch> {
        let transitioned =
            lock(&self.registry).mark_offline_if_stale(now, self.config.offline_threshold_secs);

        let mut dispatches = Vec::with_capacity(transitioned.len());
        for state in transitioned {
            tracing::warn!(
                sensor_id = %state.sensor_id,
                last_seen = %state.last_seen,
                "Sensor went offline"
            );
            if let Err(e) = self.store.save_sensor_state(&state) {
                tracing::error!(sensor_id = %state.sensor_id, error = %e, "Failed to save sensor state");
            }
            let event = events::offline_alert(&state.sensor_id, state.last_seen, now);
            dispatches.push(self.handle_alert(event, now).await);
        }
        dispatches
    }

    /// Drop rate-limit windows and cooldown records past the retention horizon.
    pub fn cleanup(&self, now: DateTime<Utc>) -> CleanupReport {
        let rate_limit_keys_removed = lock(&self.rate_limiter).purge(now);
        let cooldown_records_removed =
            lock(&self.cooldown).purge(now, self.config.cleanup_retention_secs);
        tracing::info!(
            rate_limit_keys_removed,
            cooldown_records_removed,
            "Alert gating state cleaned up"
        );
        CleanupReport {
            rate_limit_keys_removed,
            cooldown_records_removed,
        }
    }

    pub fn statistics(&self) -> AlertStatistics {
        let (total_sensors, online_sensors) = {
            let registry = lock(&self.registry);
            (registry.len(), registry.online_count())
        };
        AlertStatistics {
            total_sensors,
            online_sensors,
            cooldown_records: lock(&self.cooldown).len(),
            rate_limiter: lock(&self.rate_limiter).stats(),
        }
    }

    pub fn sensors(&self) -> Vec<SensorSnapshot> {
        lock(&self.registry).snapshot()
    }

    pub fn sensor(&self, sensor_id: &str) -> Option<SensorSnapshot> {
        lock(&self.registry).get(sensor_id)
    }

    fn notification_context(&self, kind: AlertKind, now: DateTime<Utc>) -> NotificationContext {
        let views = lock(&self.registry).views();
        NotificationContext::new(kind, views, now)
    }

    async fn handle_alert(&self, mut event: AlertEvent, now: DateTime<Utc>) -> Dispatch {
        let allowed = lock(&self.rate_limiter).allow(&event.sensor_id, event.kind, now);
        if !allowed {
            tracing::warn!(
                sensor_id = %event.sensor_id,
                kind = %event.kind,
                "Alert rate limited"
            );
            return Dispatch {
                event,
                outcome: DispatchOutcome::RateLimited,
            };
        }

        // Claimed before dispatch so a concurrent alert for the same key is
        // refused while this one is still in flight. Failed sends keep it.
        let acquired = lock(&self.cooldown).try_acquire(&event.sensor_id, event.kind, now);
        if !acquired {
            tracing::debug!(
                sensor_id = %event.sensor_id,
                kind = %event.kind,
                "Alert suppressed (cooldown period)"
            );
            return Dispatch {
                event,
                outcome: DispatchOutcome::CoolingDown,
            };
        }

        if let Err(e) = self.store.save_alert(&event) {
            tracing::error!(sensor_id = %event.sensor_id, kind = %event.kind, error = %e, "Failed to save alert");
        }

        if !self.channel.accepts(event.severity) {
            tracing::debug!(
                sensor_id = %event.sensor_id,
                kind = %event.kind,
                severity = %event.severity,
                "Alert stored but no channel routed for its severity"
            );
            return Dispatch {
                event,
                outcome: DispatchOutcome::Unrouted,
            };
        }

        let context = self.notification_context(event.kind, now);
        let outcome = match self.channel.send(&event, &context).await {
            Ok(()) => {
                event.sent = true;
                tracing::info!(
                    sensor_id = %event.sensor_id,
                    kind = %event.kind,
                    severity = %event.severity,
                    "Alert dispatched"
                );
                DispatchOutcome::Sent
            }
            Err(e) => {
                event.retry_count += 1;
                tracing::error!(
                    sensor_id = %event.sensor_id,
                    kind = %event.kind,
                    error = %e,
                    "Failed to dispatch alert"
                );
                DispatchOutcome::SendFailed
            }
        };

        Dispatch { event, outcome }
    }
}
