//! Process wiring for the climon alerting service: configuration, the MQTT
//! ingress and the background tasks around [`climon_alert::AlertManager`].

pub mod app;
pub mod config;
pub mod ingress;
