//! Title and body templates for every alert kind.
//!
//! Placeholders use `{name}` syntax and are filled by [`render`]. Unknown
//! placeholders are left in place so a missing variable is visible in the
//! delivered message instead of silently disappearing.

use crate::types::AlertKind;

#[derive(Debug, Clone, Copy)]
pub struct MessageTemplate {
    pub title: &'static str,
    pub body: &'static str,
}

pub fn template(kind: AlertKind) -> MessageTemplate {
    match kind {
        AlertKind::TemperatureHigh => MessageTemplate {
            title: "High temperature detected by sensor {sensor}",
            body: "WARNING: sensor {sensor} reached {temperature}°C, above the {threshold}°C limit for safe operation. Check ventilation and cooling.",
        },
        AlertKind::TemperatureCritical => MessageTemplate {
            title: "CRITICAL temperature detected by sensor {sensor}",
            body: "URGENT: sensor {sensor} recorded a critical temperature of {temperature}°C (critical limit: {threshold}°C). Immediate intervention required.",
        },
        AlertKind::TemperatureLow => MessageTemplate {
            title: "Low temperature detected by sensor {sensor}",
            body: "WARNING: sensor {sensor} dropped to {temperature}°C, below the {threshold}°C limit. Check the cooling setpoint.",
        },
        AlertKind::HumidityHigh => MessageTemplate {
            title: "High humidity detected by sensor {sensor}",
            body: "WARNING: sensor {sensor} recorded {humidity}% humidity, above the {threshold}% maximum. Check ventilation and humidity control.",
        },
        AlertKind::HumidityLow => MessageTemplate {
            title: "Low humidity detected by sensor {sensor}",
            body: "WARNING: sensor {sensor} recorded {humidity}% humidity, below the {threshold}% minimum. Check humidification.",
        },
        AlertKind::TemperatureVariation => MessageTemplate {
            title: "Sudden temperature swing at sensor {sensor}",
            body: "Sensor {sensor} varied by {variation}°C within 5 minutes (current: {temperature}°C), above the {threshold}°C limit. Check ventilation and cooling.",
        },
        AlertKind::SensorOffline => MessageTemplate {
            title: "Sensor {sensor} disconnected",
            body: "Sensor {sensor} has not reported since {last_seen}. Check network connectivity and power.",
        },
        AlertKind::SensorBackOnline => MessageTemplate {
            title: "Service restored after outage - sensor {sensor}",
            body: "INFO: sensor {sensor} is reporting again after being offline. Current temperature: {temperature}°C. Cluster status: {sensors_status}",
        },
    }
}

/// Substitute `{key}` placeholders in `template`.
///
/// # Examples
///
/// ```
/// use climon_common::messages::render;
///
/// let out = render("sensor {sensor} at {temperature}°C", &[
///     ("sensor", "a".to_string()),
///     ("temperature", "31.0".to_string()),
/// ]);
/// assert_eq!(out, "sensor a at 31.0°C");
/// ```
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_leaves_unknown_placeholders() {
        let out = render("{sensor} {missing}", &[("sensor", "b".to_string())]);
        assert_eq!(out, "b {missing}");
    }

    #[test]
    fn every_kind_has_a_sensor_placeholder_in_its_title() {
        let kinds = [
            AlertKind::TemperatureHigh,
            AlertKind::TemperatureCritical,
            AlertKind::TemperatureLow,
            AlertKind::HumidityHigh,
            AlertKind::HumidityLow,
            AlertKind::TemperatureVariation,
            AlertKind::SensorOffline,
            AlertKind::SensorBackOnline,
        ];
        for kind in kinds {
            assert!(template(kind).title.contains("{sensor}"), "{kind}");
        }
    }
}
