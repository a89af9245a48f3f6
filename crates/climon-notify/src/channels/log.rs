use crate::error::{NotifyError, Result};
use crate::plugin::ChannelPlugin;
use crate::{NotificationChannel, NotificationContext};
use async_trait::async_trait;
use climon_common::types::{AlertEvent, Severity};
use serde::Deserialize;
use serde_json::Value;

/// Writes alerts to the process log. Useful as a default channel and in
/// deployments without an outbound receiver.
pub struct LogChannel {
    prefix: String,
}

impl LogChannel {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn subject(&self, alert: &AlertEvent) -> String {
        if self.prefix.is_empty() {
            alert.title()
        } else {
            format!("{} {}", self.prefix, alert.title())
        }
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, alert: &AlertEvent, context: &NotificationContext) -> Result<()> {
        let subject = self.subject(alert);
        let plotted = context.chart_series().len();
        if alert.severity >= Severity::High {
            tracing::warn!(
                sensor_id = %alert.sensor_id,
                kind = %alert.kind,
                severity = %alert.severity,
                chart_minutes = context.chart_window_minutes,
                plotted_sensors = plotted,
                body = %alert.message,
                "{subject}"
            );
        } else {
            tracing::info!(
                sensor_id = %alert.sensor_id,
                kind = %alert.kind,
                severity = %alert.severity,
                chart_minutes = context.chart_window_minutes,
                plotted_sensors = plotted,
                body = %alert.message,
                "{subject}"
            );
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}

// Plugin

#[derive(Deserialize)]
struct LogConfig {
    #[serde(default = "default_prefix")]
    prefix: String,
}

fn default_prefix() -> String {
    "[CLUSTER ALERT]".to_string()
}

pub struct LogPlugin;

impl ChannelPlugin for LogPlugin {
    fn name(&self) -> &str {
        "log"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        serde_json::from_value::<LogConfig>(config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("log: {e}")))?;
        Ok(())
    }

    fn create_channel(&self, config: &Value) -> Result<Box<dyn NotificationChannel>> {
        let cfg: LogConfig = serde_json::from_value(config.clone())?;
        Ok(Box::new(LogChannel::new(&cfg.prefix)))
    }
}
