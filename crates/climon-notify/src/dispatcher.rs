use crate::error::{NotifyError, Result};
use crate::{NotificationChannel, NotificationContext};
use async_trait::async_trait;
use climon_common::types::{AlertEvent, Severity};
use tracing;

struct Route {
    channel: Box<dyn NotificationChannel>,
    min_severity: Severity,
}

impl Route {
    fn should_send(&self, event_severity: Severity) -> bool {
        event_severity >= self.min_severity
    }
}

/// Fans an alert out to every channel whose minimum severity it meets.
///
/// The dispatcher is itself a [`NotificationChannel`], so the alert manager
/// only ever sees one channel. Delivery fails if any routed channel fails;
/// channels that succeeded are not rolled back.
#[derive(Default)]
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>, min_severity: Severity) {
        self.routes.push(Route {
            channel,
            min_severity,
        });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl NotificationChannel for Dispatcher {
    async fn send(&self, alert: &AlertEvent, context: &NotificationContext) -> Result<()> {
        let mut attempted = 0usize;
        let mut failed = 0usize;

        for route in &self.routes {
            if !route.should_send(alert.severity) {
                continue;
            }
            attempted += 1;
            if let Err(e) = route.channel.send(alert, context).await {
                failed += 1;
                tracing::error!(
                    channel = route.channel.channel_name(),
                    sensor_id = %alert.sensor_id,
                    kind = %alert.kind,
                    error = %e,
                    "Failed to send notification"
                );
            }
        }

        if attempted == 0 {
            return Err(NotifyError::NoRoute(alert.severity));
        }

        if failed > 0 {
            return Err(NotifyError::PartialFailure { failed, attempted });
        }
        Ok(())
    }

    fn accepts(&self, severity: Severity) -> bool {
        self.routes.iter().any(|route| route.should_send(severity))
    }

    fn channel_name(&self) -> &str {
        "dispatcher"
    }
}
