use crate::error::IngestError;
use climon_common::types::SensorReading;
use serde::Deserialize;
use std::collections::BTreeSet;

/// A reading as it came off the bus, before validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawReading {
    pub sensor_id: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl RawReading {
    pub fn new(sensor_id: &str, temperature: f64, humidity: f64) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            temperature: Some(temperature),
            humidity: Some(humidity),
        }
    }
}

/// Liveness announcement a sensor publishes on the shared status topic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusMessage {
    #[serde(alias = "esp_id", default = "unknown")]
    pub sensor_id: String,
    #[serde(default = "unknown")]
    pub status: String,
}

fn unknown() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum BusMessage {
    Reading(RawReading),
    Status(StatusMessage),
}

#[derive(Deserialize)]
struct ReadingPayload {
    temperature: Option<f64>,
    humidity: Option<f64>,
}

/// Decode one bus message. `<prefix>/status` carries [`StatusMessage`]s,
/// `<prefix>/<sensor_id>` carries readings.
pub fn parse_bus_message(
    prefix: &str,
    topic: &str,
    payload: &[u8],
) -> Result<BusMessage, IngestError> {
    let sensor_id = topic
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|id| !id.is_empty() && !id.contains('/'))
        .ok_or_else(|| IngestError::UnknownTopic(topic.to_string()))?;

    let malformed = |source| IngestError::MalformedPayload {
        topic: topic.to_string(),
        source,
    };

    if sensor_id == "status" {
        let status: StatusMessage = serde_json::from_slice(payload).map_err(malformed)?;
        return Ok(BusMessage::Status(status));
    }

    let body: ReadingPayload = serde_json::from_slice(payload).map_err(malformed)?;
    Ok(BusMessage::Reading(RawReading {
        sensor_id: sensor_id.to_string(),
        temperature: body.temperature,
        humidity: body.humidity,
    }))
}

/// The set of sensor ids the engine accepts. This is the only admission
/// check; there is no separate blacklist.
#[derive(Debug, Clone)]
pub struct SensorWhitelist {
    ids: BTreeSet<String>,
}

impl SensorWhitelist {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn accepts(&self, sensor_id: &str) -> bool {
        self.ids.contains(sensor_id)
    }

    pub fn validate(&self, raw: RawReading) -> Result<SensorReading, IngestError> {
        if !self.accepts(&raw.sensor_id) {
            return Err(IngestError::UnknownSensor(raw.sensor_id));
        }
        let temperature = require(&raw.sensor_id, "temperature", raw.temperature)?;
        let humidity = require(&raw.sensor_id, "humidity", raw.humidity)?;
        Ok(SensorReading {
            sensor_id: raw.sensor_id,
            temperature,
            humidity,
        })
    }
}

fn require(sensor_id: &str, field: &'static str, value: Option<f64>) -> Result<f64, IngestError> {
    match value {
        None => Err(IngestError::MissingField {
            sensor_id: sensor_id.to_string(),
            field,
        }),
        Some(v) if !v.is_finite() => Err(IngestError::NonFinite {
            sensor_id: sensor_id.to_string(),
            field,
            value: v,
        }),
        Some(v) => Ok(v),
    }
}
