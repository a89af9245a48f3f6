use anyhow::{bail, Context};
use climon_alert::AlertConfig;
use climon_common::types::Severity;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/climon.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Level for the `climon` crates unless `RUST_LOG` says otherwise.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How often manager statistics are written to the log.
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,

    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            stats_interval_secs: default_stats_interval_secs(),
            mqtt: MqttConfig::default(),
            database: DatabaseConfig::default(),
            alert: AlertConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_mqtt_client_id")]
    pub client_id: String,
    /// Readings arrive on `<prefix>/<sensor_id>`, announcements on `<prefix>/status`.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Pause before polling again after a connection error.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_mqtt_client_id(),
            topic_prefix: default_topic_prefix(),
            keep_alive_secs: default_keep_alive_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            username: None,
            password: None,
        }
    }
}

impl MqttConfig {
    /// Single-level wildcard subscription covering readings and status.
    pub fn subscription(&self) -> String {
        format!("{}/+", self.topic_prefix)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
        }
    }
}

/// One `[[notify.channels]]` entry. `config` is handed to the channel plugin
/// registered under `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(rename = "type")]
    pub channel_type: String,
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
    #[serde(default = "default_channel_config")]
    pub config: serde_json::Value,
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Like [`load`](Self::load) but a missing file yields the defaults.
    /// The flag tells the caller whether the file existed.
    pub fn load_or_default(path: &Path) -> anyhow::Result<(Self, bool)> {
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        Ok((Self::load(path)?, true))
    }

    /// Reject settings that would make detection or gating meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        let t = &self.alert.temperature;
        if !(t.critical_low < t.low && t.low < t.high && t.high < t.critical_high) {
            bail!(
                "temperature thresholds must satisfy critical_low < low < high < critical_high (got {} / {} / {} / {})",
                t.critical_low,
                t.low,
                t.high,
                t.critical_high
            );
        }
        let h = &self.alert.humidity;
        if h.low >= h.high {
            bail!("humidity low ({}) must be below high ({})", h.low, h.high);
        }
        let v = &self.alert.variation;
        if v.threshold <= 0.0 {
            bail!("variation threshold must be positive");
        }
        if v.history_retention_secs < v.window_secs {
            bail!(
                "history retention ({}s) must cover the variation window ({}s)",
                v.history_retention_secs,
                v.window_secs
            );
        }
        if self.alert.max_alerts_per_hour == 0 {
            bail!("max_alerts_per_hour must be at least 1");
        }
        if self.alert.sensors.is_empty() {
            bail!("at least one sensor id must be configured");
        }
        if self.mqtt.topic_prefix.is_empty() || self.mqtt.topic_prefix.contains(['+', '#']) {
            bail!("invalid mqtt topic prefix '{}'", self.mqtt.topic_prefix);
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stats_interval_secs() -> u64 {
    300
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_client_id() -> String {
    "climon-alerting".to_string()
}

fn default_topic_prefix() -> String {
    "legion32".to_string()
}

fn default_keep_alive_secs() -> u64 {
    60
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_database_path() -> String {
    "data/climon.db".to_string()
}

fn default_channels() -> Vec<ChannelConfig> {
    vec![ChannelConfig {
        channel_type: "log".to_string(),
        min_severity: default_min_severity(),
        config: default_channel_config(),
    }]
}

fn default_min_severity() -> Severity {
    Severity::Low
}

fn default_channel_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
