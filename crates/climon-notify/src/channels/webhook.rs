use crate::error::{NotifyError, Result};
use crate::plugin::ChannelPlugin;
use crate::utils::{truncate_string, MAX_BODY_LENGTH};
use crate::{NotificationChannel, NotificationContext};
use async_trait::async_trait;
use climon_common::types::AlertEvent;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing;

const MAX_ATTEMPTS: u32 = 3;

/// POSTs the alert and its cluster context as JSON to a fixed URL.
pub struct WebhookChannel {
    url: String,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    pub fn render_body(alert: &AlertEvent, context: &NotificationContext) -> Value {
        serde_json::json!({
            "title": alert.title(),
            "sensor_id": alert.sensor_id,
            "kind": alert.kind,
            "severity": alert.severity,
            "message": alert.message,
            "timestamp": alert.timestamp.to_rfc3339(),
            "data": alert.data,
            "context": context,
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, alert: &AlertEvent, context: &NotificationContext) -> Result<()> {
        let body = Self::render_body(alert, context);
        let mut last_err = None;

        for attempt in 0..MAX_ATTEMPTS {
            match self.client.post(&self.url).json(&body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        tracing::debug!(url = %self.url, attempt = attempt + 1, "Webhook delivered");
                        return Ok(());
                    }
                    let resp_body = match resp.text().await {
                        Ok(text) => truncate_string(&text, MAX_BODY_LENGTH),
                        Err(e) => format!("[Failed to read response body: {e}]"),
                    };
                    tracing::warn!(
                        attempt = attempt + 1,
                        status = %status,
                        "Webhook returned non-success status, retrying"
                    );
                    last_err = Some(NotifyError::ApiError {
                        service: "webhook".to_string(),
                        status: status.as_u16(),
                        body: resp_body,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "Webhook send failed, retrying"
                    );
                    last_err = Some(e.into());
                }
            }
            if attempt + 1 < MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt))).await;
            }
        }

        match last_err {
            Some(e) => {
                tracing::error!(url = %self.url, error = %e, "Webhook failed after {MAX_ATTEMPTS} attempts");
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

// Plugin

#[derive(Deserialize)]
struct WebhookConfig {
    url: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

pub struct WebhookPlugin;

impl ChannelPlugin for WebhookPlugin {
    fn name(&self) -> &str {
        "webhook"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        let cfg = serde_json::from_value::<WebhookConfig>(config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("webhook: {e}")))?;
        if !(cfg.url.starts_with("http://") || cfg.url.starts_with("https://")) {
            return Err(NotifyError::InvalidConfig(format!(
                "webhook: url must be http(s), got '{}'",
                cfg.url
            )));
        }
        Ok(())
    }

    fn create_channel(&self, config: &Value) -> Result<Box<dyn NotificationChannel>> {
        let cfg: WebhookConfig = serde_json::from_value(config.clone())?;
        Ok(Box::new(WebhookChannel::new(&cfg.url, cfg.timeout_secs)?))
    }
}
