mod common;

use anyhow::{anyhow, Result};
use chrono::{Duration, TimeZone, Utc};
use climon_common::types::{AlertKind, SensorStatus, Severity};
use climon_server::ingress::handle_publish;
use common::{build_test_context, reading, PREFIX};

#[tokio::test]
async fn reading_on_sensor_topic_is_stored_and_alerted() -> Result<()> {
    let ctx = build_test_context()?;
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    let report = handle_publish(&ctx.manager, PREFIX, "legion32/a", &reading(31.0, 45.0), now)
        .await
        .ok_or_else(|| anyhow!("reading should be accepted"))?;
    let alert = report.alert.ok_or_else(|| anyhow!("critical reading should alert"))?;
    assert_eq!(alert.event.kind, AlertKind::TemperatureCritical);
    assert_eq!(alert.event.severity, Severity::Critical);

    let stored = ctx.store.recent_alerts(Some("a"), 10)?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].kind, AlertKind::TemperatureCritical);
    assert_eq!(ctx.channel.events().len(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_sensor_and_status_messages_do_not_touch_state() -> Result<()> {
    let ctx = build_test_context()?;
    let now = Utc::now();

    assert!(handle_publish(&ctx.manager, PREFIX, "legion32/c", &reading(40.0, 90.0), now)
        .await
        .is_none());
    assert!(handle_publish(
        &ctx.manager,
        PREFIX,
        "legion32/status",
        br#"{"esp_id": "a", "status": "offline"}"#,
        now,
    )
    .await
    .is_none());
    assert!(handle_publish(&ctx.manager, PREFIX, "legion32/a", b"{not json", now)
        .await
        .is_none());
    assert!(handle_publish(&ctx.manager, PREFIX, "elsewhere/a", &reading(20.0, 40.0), now)
        .await
        .is_none());

    assert!(ctx.manager.sensors().is_empty());
    assert!(ctx.store.recent_alerts(None, 10)?.is_empty());
    assert!(ctx.channel.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn offline_sensor_comes_back_through_the_bus() -> Result<()> {
    let ctx = build_test_context()?;
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    handle_publish(&ctx.manager, PREFIX, "legion32/a", &reading(22.0, 45.0), t0).await;
    handle_publish(&ctx.manager, PREFIX, "legion32/b", &reading(23.0, 48.0), t0).await;

    let offline = ctx.manager.check_sensor_health(t0 + Duration::seconds(301)).await;
    assert_eq!(offline.len(), 2);

    let later = t0 + Duration::seconds(900);
    let report = handle_publish(&ctx.manager, PREFIX, "legion32/b", &reading(23.5, 47.0), later)
        .await
        .ok_or_else(|| anyhow!("reading should be accepted"))?;
    let back = report
        .back_online
        .ok_or_else(|| anyhow!("sensor b should be reported back online"))?;
    assert_eq!(
        back.event.data["sensors_status"],
        "[offline] Sensor a: 22.0°C, 45.0% | [online] Sensor b: 23.5°C, 47.0%"
    );

    assert_eq!(ctx.manager.sensor("a").map(|s| s.status), Some(SensorStatus::Offline));
    assert_eq!(ctx.manager.sensor("b").map(|s| s.status), Some(SensorStatus::Online));

    let kinds: Vec<AlertKind> = ctx.channel.events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AlertKind::SensorOffline,
            AlertKind::SensorOffline,
            AlertKind::SensorBackOnline,
        ]
    );
    Ok(())
}
