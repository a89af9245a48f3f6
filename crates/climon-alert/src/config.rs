use serde::{Deserialize, Serialize};

/// Tunables for detection and gating. Every field has a default so a partial
/// `[alert]` table is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default)]
    pub temperature: TemperatureThresholds,
    #[serde(default)]
    pub humidity: HumidityThresholds,
    #[serde(default)]
    pub variation: VariationConfig,

    /// Minimum seconds between two notifications for the same cooldown key.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default)]
    pub cooldown_scope: CooldownScope,

    /// A sensor silent for longer than this is marked offline.
    #[serde(default = "default_offline_threshold_secs")]
    pub offline_threshold_secs: u64,

    /// Cap on notifications per (sensor, kind) within any trailing hour.
    #[serde(default = "default_max_alerts_per_hour")]
    pub max_alerts_per_hour: usize,

    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Cooldown records older than this are dropped by the cleanup pass.
    #[serde(default = "default_cleanup_retention_secs")]
    pub cleanup_retention_secs: u64,

    /// Sensor ids accepted at ingress. Everything else is rejected.
    #[serde(default = "default_sensors")]
    pub sensors: Vec<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            temperature: TemperatureThresholds::default(),
            humidity: HumidityThresholds::default(),
            variation: VariationConfig::default(),
            cooldown_secs: default_cooldown_secs(),
            cooldown_scope: CooldownScope::default(),
            offline_threshold_secs: default_offline_threshold_secs(),
            max_alerts_per_hour: default_max_alerts_per_hour(),
            health_check_interval_secs: default_health_check_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            cleanup_retention_secs: default_cleanup_retention_secs(),
            sensors: default_sensors(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureThresholds {
    #[serde(default = "default_temp_critical_high")]
    pub critical_high: f64,
    #[serde(default = "default_temp_high")]
    pub high: f64,
    #[serde(default = "default_temp_low")]
    pub low: f64,
    #[serde(default = "default_temp_critical_low")]
    pub critical_low: f64,
}

impl Default for TemperatureThresholds {
    fn default() -> Self {
        Self {
            critical_high: default_temp_critical_high(),
            high: default_temp_high(),
            low: default_temp_low(),
            critical_low: default_temp_critical_low(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumidityThresholds {
    #[serde(default = "default_humidity_high")]
    pub high: f64,
    #[serde(default = "default_humidity_low")]
    pub low: f64,
}

impl Default for HumidityThresholds {
    fn default() -> Self {
        Self {
            high: default_humidity_high(),
            low: default_humidity_low(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationConfig {
    /// Max minus min temperature inside the window that triggers an alert.
    #[serde(default = "default_variation_threshold")]
    pub threshold: f64,
    /// Trailing window the spread is computed over.
    #[serde(default = "default_variation_window_secs")]
    pub window_secs: u64,
    /// How long readings stay in a sensor's history. Kept a minute longer
    /// than `window_secs` to absorb scheduling jitter.
    #[serde(default = "default_history_retention_secs")]
    pub history_retention_secs: u64,
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            threshold: default_variation_threshold(),
            window_secs: default_variation_window_secs(),
            history_retention_secs: default_history_retention_secs(),
        }
    }
}

/// What a cooldown record is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    /// Any notification for a sensor silences every kind on that sensor.
    #[default]
    Sensor,
    /// Each (sensor, kind) pair cools down independently.
    SensorAndKind,
}

fn default_temp_critical_high() -> f64 {
    30.0
}

fn default_temp_high() -> f64 {
    27.0
}

fn default_temp_low() -> f64 {
    15.0
}

fn default_temp_critical_low() -> f64 {
    5.0
}

fn default_humidity_high() -> f64 {
    70.0
}

fn default_humidity_low() -> f64 {
    30.0
}

fn default_variation_threshold() -> f64 {
    5.0
}

fn default_variation_window_secs() -> u64 {
    300
}

fn default_history_retention_secs() -> u64 {
    360
}

fn default_cooldown_secs() -> u64 {
    300
}

fn default_offline_threshold_secs() -> u64 {
    300
}

fn default_max_alerts_per_hour() -> usize {
    10
}

fn default_health_check_interval_secs() -> u64 {
    60
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

fn default_cleanup_retention_secs() -> u64 {
    3600
}

fn default_sensors() -> Vec<String> {
    vec!["a".to_string(), "b".to_string()]
}
