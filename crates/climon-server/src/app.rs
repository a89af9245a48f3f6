use crate::config::{NotifyConfig, ServerConfig};
use crate::ingress::MqttIngress;
use anyhow::{Context, Result};
use chrono::Utc;
use climon_alert::scheduler::{shutdown_signalled, MaintenanceScheduler};
use climon_alert::AlertManager;
use climon_notify::dispatcher::Dispatcher;
use climon_notify::plugin::ChannelRegistry;
use climon_storage::SqliteStore;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Build one routed channel per `[[notify.channels]]` entry.
pub fn build_dispatcher(config: &NotifyConfig, registry: &ChannelRegistry) -> Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new();
    for (index, channel) in config.channels.iter().enumerate() {
        let built = registry
            .create_channel(&channel.channel_type, &channel.config)
            .with_context(|| format!("notify.channels[{index}] ({})", channel.channel_type))?;
        tracing::info!(
            channel = %channel.channel_type,
            min_severity = %channel.min_severity,
            "Notification channel configured"
        );
        dispatcher.add_channel(built, channel.min_severity);
    }
    if dispatcher.is_empty() {
        tracing::warn!("No notification channels configured; alerts will only be stored");
    }
    Ok(dispatcher)
}

pub fn build_manager(config: &ServerConfig) -> Result<Arc<AlertManager>> {
    let store = Arc::new(
        SqliteStore::open(Path::new(&config.database.path))
            .with_context(|| format!("Failed to open database '{}'", config.database.path))?,
    );
    let dispatcher = build_dispatcher(&config.notify, &ChannelRegistry::default())?;
    Ok(Arc::new(AlertManager::new(
        config.alert.clone(),
        store,
        Arc::new(dispatcher),
    )))
}

async fn log_statistics(
    manager: Arc<AlertManager>,
    every_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = interval(Duration::from_secs(every_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let stats = manager.statistics();
                tracing::info!(
                    total_sensors = stats.total_sensors,
                    online_sensors = stats.online_sensors,
                    cooldown_records = stats.cooldown_records,
                    rate_limit_keys = stats.rate_limiter.active_keys,
                    rate_limit_keys_with_entries = stats.rate_limiter.keys_with_entries,
                    "Alert manager statistics"
                );
            }
            _ = shutdown_signalled(&mut shutdown) => break,
        }
    }
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!(
        mqtt = %format!("{}:{}", config.mqtt.host, config.mqtt.port),
        topic_prefix = %config.mqtt.topic_prefix,
        db = %config.database.path,
        sensors = ?config.alert.sensors,
        "climon-server starting"
    );

    let manager = build_manager(&config)?;
    manager.restore(Utc::now());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut handles = MaintenanceScheduler::new(manager.clone()).spawn(shutdown_rx.clone());
    handles.push(tokio::spawn(log_statistics(
        manager.clone(),
        config.stats_interval_secs,
        shutdown_rx.clone(),
    )));
    handles.push(tokio::spawn(
        MqttIngress::new(config.mqtt.clone(), manager.clone()).run(shutdown_rx),
    ));

    tracing::info!("Server started");

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down gracefully");

    // Receivers may already be gone if a task exited early.
    let _ = shutdown_tx.send(true);
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Background task ended abnormally");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}
