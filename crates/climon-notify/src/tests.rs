use crate::channels::log::LogChannel;
use crate::channels::webhook::WebhookChannel;
use crate::context::SensorView;
use crate::dispatcher::Dispatcher;
use crate::plugin::ChannelRegistry;
use crate::{NotificationChannel, NotificationContext, NotifyError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use climon_common::types::{
    AlertEvent, AlertKind, SensorSnapshot, SensorStatus, Severity, TemperatureReading,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct CountingChannel {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl NotificationChannel for CountingChannel {
    async fn send(&self, _alert: &AlertEvent, _context: &NotificationContext) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotifyError::InvalidConfig("boom".into()));
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "counting"
    }
}

fn alert(severity: Severity) -> AlertEvent {
    AlertEvent::new(
        "a",
        AlertKind::TemperatureHigh,
        severity,
        "sensor a reached 28.0°C".into(),
        Utc::now(),
    )
    .with_data("title", "High temperature detected by sensor a")
}

fn view(sensor: &str, points: &[(f64, i64)]) -> SensorView {
    let now = Utc::now();
    SensorView {
        snapshot: SensorSnapshot {
            sensor_id: sensor.to_string(),
            last_seen: now,
            temperature: points.last().map(|p| p.0).unwrap_or(0.0),
            humidity: 50.0,
            status: SensorStatus::Online,
        },
        history: points
            .iter()
            .map(|(t, secs_ago)| TemperatureReading {
                temperature: *t,
                timestamp: now - Duration::seconds(*secs_ago),
            })
            .collect(),
    }
}

#[tokio::test]
async fn dispatcher_routes_by_minimum_severity() {
    let low_calls = Arc::new(AtomicUsize::new(0));
    let critical_calls = Arc::new(AtomicUsize::new(0));

    let mut dispatcher = Dispatcher::new();
    dispatcher.add_channel(
        Box::new(CountingChannel {
            calls: low_calls.clone(),
            fail: false,
        }),
        Severity::Low,
    );
    dispatcher.add_channel(
        Box::new(CountingChannel {
            calls: critical_calls.clone(),
            fail: false,
        }),
        Severity::Critical,
    );

    let ctx = NotificationContext::new(AlertKind::TemperatureHigh, vec![], Utc::now());
    dispatcher.send(&alert(Severity::High), &ctx).await.unwrap();
    dispatcher.send(&alert(Severity::Critical), &ctx).await.unwrap();

    assert_eq!(low_calls.load(Ordering::SeqCst), 2);
    assert_eq!(critical_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dispatcher_without_matching_route_reports_no_route() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_channel(
        Box::new(CountingChannel {
            calls: calls.clone(),
            fail: false,
        }),
        Severity::Critical,
    );

    assert!(!dispatcher.accepts(Severity::Medium));
    assert!(dispatcher.accepts(Severity::Critical));
    assert!(!Dispatcher::new().accepts(Severity::Critical));

    let ctx = NotificationContext::new(AlertKind::HumidityHigh, vec![], Utc::now());
    let err = dispatcher.send(&alert(Severity::Medium), &ctx).await.unwrap_err();
    assert!(matches!(err, NotifyError::NoRoute(Severity::Medium)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dispatcher_reports_failure_but_still_tries_every_route() {
    let failing = Arc::new(AtomicUsize::new(0));
    let healthy = Arc::new(AtomicUsize::new(0));

    let mut dispatcher = Dispatcher::new();
    dispatcher.add_channel(
        Box::new(CountingChannel {
            calls: failing.clone(),
            fail: true,
        }),
        Severity::Low,
    );
    dispatcher.add_channel(
        Box::new(CountingChannel {
            calls: healthy.clone(),
            fail: false,
        }),
        Severity::Low,
    );

    let ctx = NotificationContext::new(AlertKind::TemperatureHigh, vec![], Utc::now());
    let err = dispatcher.send(&alert(Severity::Medium), &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        NotifyError::PartialFailure {
            failed: 1,
            attempted: 2
        }
    ));
    assert_eq!(failing.load(Ordering::SeqCst), 1);
    assert_eq!(healthy.load(Ordering::SeqCst), 1);
}

#[test]
fn chart_series_respects_window_and_skips_sparse_sensors() {
    let ctx = NotificationContext::new(
        AlertKind::TemperatureHigh,
        vec![
            view("a", &[(20.0, 900), (21.0, 120), (22.0, 60)]),
            view("b", &[(19.0, 30)]),
        ],
        Utc::now(),
    );
    assert_eq!(ctx.chart_window_minutes, 10);

    let series = ctx.chart_series();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].0, "a");
    // the 15-minute-old point falls outside the 10-minute window
    assert_eq!(series[0].1.len(), 2);
}

#[test]
fn offline_alerts_use_wider_chart_window() {
    let ctx = NotificationContext::new(AlertKind::SensorOffline, vec![], Utc::now());
    assert_eq!(ctx.chart_window_minutes, 30);
}

#[tokio::test]
async fn log_channel_always_succeeds() {
    let channel = LogChannel::new("[TEST]");
    let ctx = NotificationContext::new(AlertKind::TemperatureHigh, vec![], Utc::now());
    assert!(channel.send(&alert(Severity::Critical), &ctx).await.is_ok());
    assert!(channel.send(&alert(Severity::Low), &ctx).await.is_ok());
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn log_channel_keeps_alert_body_apart_from_subject() {
    let captured = CapturedLog::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let channel = LogChannel::new("[TEST]");
    let ctx = NotificationContext::new(AlertKind::TemperatureHigh, vec![], Utc::now());
    channel.send(&alert(Severity::High), &ctx).await.unwrap();

    let line = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(line.contains("[TEST] High temperature detected by sensor a"));
    assert!(line.contains("body=sensor a reached 28.0°C"));
    assert!(!line.contains("message="));
}

#[test]
fn webhook_body_carries_title_and_context() {
    let ctx = NotificationContext::new(
        AlertKind::TemperatureHigh,
        vec![view("a", &[(27.5, 60), (28.0, 0)])],
        Utc::now(),
    );
    let body = WebhookChannel::render_body(&alert(Severity::High), &ctx);
    assert_eq!(body["title"], "High temperature detected by sensor a");
    assert_eq!(body["kind"], "temperature_high");
    assert_eq!(body["severity"], "HIGH");
    assert_eq!(body["context"]["sensors"][0]["sensor_id"], "a");
    assert_eq!(body["context"]["sensors"][0]["status"], "online");
    assert_eq!(
        body["context"]["sensors"][0]["history"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );
}

// ── Plugin registry tests ──

#[test]
fn registry_default_has_all_builtin_plugins() {
    let registry = ChannelRegistry::default();
    let mut names = registry.plugin_names();
    names.sort();
    assert_eq!(names, vec!["log", "webhook"]);
}

#[test]
fn registry_unknown_plugin_returns_error() {
    let registry = ChannelRegistry::default();
    let result = registry.create_channel("email", &serde_json::json!({}));
    let err = result.err().expect("should return error for unknown plugin");
    assert!(
        matches!(err, NotifyError::UnknownChannelType(ref t) if t == "email"),
        "error was: {err}"
    );
}

#[test]
fn log_plugin_accepts_empty_config() {
    let registry = ChannelRegistry::default();
    let channel = registry
        .create_channel("log", &serde_json::json!({}))
        .unwrap();
    assert_eq!(channel.channel_name(), "log");
}

#[test]
fn webhook_plugin_validates_config() {
    let registry = ChannelRegistry::default();

    let valid = serde_json::json!({ "url": "https://hooks.example.com/climon" });
    assert!(registry.create_channel("webhook", &valid).is_ok());

    let missing_url = serde_json::json!({});
    assert!(registry.create_channel("webhook", &missing_url).is_err());

    let bad_scheme = serde_json::json!({ "url": "ftp://hooks.example.com" });
    assert!(matches!(
        registry.create_channel("webhook", &bad_scheme),
        Err(NotifyError::InvalidConfig(_))
    ));
}
