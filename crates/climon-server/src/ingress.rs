use crate::config::MqttConfig;
use chrono::{DateTime, Utc};
use climon_alert::scheduler::shutdown_signalled;
use climon_alert::{parse_bus_message, AlertManager, BusMessage, IngestReport};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Subscribes to the sensor topics and feeds every reading to the manager.
pub struct MqttIngress {
    config: MqttConfig,
    manager: Arc<AlertManager>,
}

impl MqttIngress {
    pub fn new(config: MqttConfig, manager: Arc<AlertManager>) -> Self {
        Self { config, manager }
    }

    fn connect(&self) -> (AsyncClient, EventLoop) {
        let mut options = MqttOptions::new(
            self.config.client_id.as_str(),
            self.config.host.as_str(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs.max(5)));
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            options.set_credentials(user.as_str(), pass.as_str());
        }
        AsyncClient::new(options, 64)
    }

    /// Poll the broker until shutdown. Connection errors are logged and
    /// retried after `reconnect_delay_secs`; the event loop reconnects on
    /// the next poll.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let (client, mut eventloop) = self.connect();
        let subscription = self.config.subscription();
        let retry_delay = Duration::from_secs(self.config.reconnect_delay_secs.max(1));

        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            topic = %subscription,
            "MQTT ingress starting"
        );

        loop {
            let event = tokio::select! {
                event = eventloop.poll() => event,
                _ = shutdown_signalled(&mut shutdown) => break,
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // Subscriptions do not survive a clean-session reconnect.
                    match client.try_subscribe(subscription.as_str(), QoS::AtMostOnce) {
                        Ok(()) => tracing::info!(topic = %subscription, "Subscribed to sensor topics"),
                        Err(e) => tracing::error!(topic = %subscription, error = %e, "Failed to subscribe"),
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let manager = self.manager.clone();
                    let prefix = self.config.topic_prefix.clone();
                    tokio::spawn(async move {
                        handle_publish(&manager, &prefix, &publish.topic, &publish.payload, Utc::now())
                            .await;
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "MQTT connection error, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(retry_delay) => {}
                        _ = shutdown_signalled(&mut shutdown) => break,
                    }
                }
            }
        }

        if let Err(e) = client.try_disconnect() {
            tracing::debug!(error = %e, "MQTT disconnect request failed");
        }
        tracing::info!("MQTT ingress stopped");
    }
}

/// Route one bus message. Readings go to the manager; status announcements
/// are only logged. Returns the ingest report for accepted readings.
pub async fn handle_publish(
    manager: &AlertManager,
    prefix: &str,
    topic: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> Option<IngestReport> {
    match parse_bus_message(prefix, topic, payload) {
        Ok(BusMessage::Reading(raw)) => manager.ingest(raw, now).await.ok(),
        Ok(BusMessage::Status(status)) => {
            if manager.whitelist().accepts(&status.sensor_id) {
                tracing::info!(
                    sensor_id = %status.sensor_id,
                    status = %status.status,
                    "Sensor status announcement"
                );
            } else {
                tracing::debug!(sensor_id = %status.sensor_id, "Status from unknown sensor ignored");
            }
            None
        }
        Err(e) => {
            tracing::warn!(topic, error = %e, "Dropped bus message");
            None
        }
    }
}
