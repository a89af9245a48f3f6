use thiserror::Error;

/// Why an inbound reading was refused. Rejected readings never touch
/// sensor state.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("sensor '{0}' is not in the accepted set")]
    UnknownSensor(String),

    #[error("reading from '{sensor_id}' is missing {field}")]
    MissingField {
        sensor_id: String,
        field: &'static str,
    },

    #[error("reading from '{sensor_id}' has non-finite {field}: {value}")]
    NonFinite {
        sensor_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("malformed payload on '{topic}': {source}")]
    MalformedPayload {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("topic '{0}' is not a sensor topic")]
    UnknownTopic(String),
}
