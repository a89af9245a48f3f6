use crate::manager::AlertManager;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Runs the periodic health-check and cleanup passes.
///
/// Both loops watch the same shutdown flag. Once it flips they stop
/// scheduling new passes; a pass already running finishes first.
pub struct MaintenanceScheduler {
    manager: Arc<AlertManager>,
    health_check_secs: u64,
    cleanup_secs: u64,
}

impl MaintenanceScheduler {
    pub fn new(manager: Arc<AlertManager>) -> Self {
        let config = manager.config();
        Self {
            health_check_secs: config.health_check_interval_secs,
            cleanup_secs: config.cleanup_interval_secs,
            manager,
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let health = {
            let manager = self.manager.clone();
            let shutdown = shutdown.clone();
            let secs = self.health_check_secs;
            tokio::spawn(async move { run_health_check(manager, secs, shutdown).await })
        };
        let cleanup = {
            let manager = self.manager;
            let secs = self.cleanup_secs;
            tokio::spawn(async move { run_cleanup(manager, secs, shutdown).await })
        };
        vec![health, cleanup]
    }
}

pub async fn run_health_check(
    manager: Arc<AlertManager>,
    every_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(interval_secs = every_secs, "Sensor health check started");
    let mut tick = interval(Duration::from_secs(every_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let dispatches = manager.check_sensor_health(Utc::now()).await;
                if !dispatches.is_empty() {
                    tracing::info!(offline = dispatches.len(), "Health check flagged sensors offline");
                }
            }
            _ = shutdown_signalled(&mut shutdown) => break,
        }
    }
    tracing::info!("Sensor health check stopped");
}

pub async fn run_cleanup(
    manager: Arc<AlertManager>,
    every_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(interval_secs = every_secs, "Alert state cleanup started");
    let mut tick = interval(Duration::from_secs(every_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing is stale at startup.
    tick.tick().await;
    loop {
        tokio::select! {
            _ = tick.tick() => {
                manager.cleanup(Utc::now());
            }
            _ = shutdown_signalled(&mut shutdown) => break,
        }
    }
    tracing::info!("Alert state cleanup stopped");
}

/// Resolves once the flag is set or the sender is gone.
pub async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
