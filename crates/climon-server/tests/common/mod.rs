#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use climon_alert::{AlertConfig, AlertManager};
use climon_common::types::AlertEvent;
use climon_notify::{NotificationChannel, NotificationContext};
use climon_storage::SqliteStore;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const PREFIX: &str = "legion32";

#[derive(Default)]
pub struct CaptureChannel {
    pub events: Mutex<Vec<AlertEvent>>,
}

impl CaptureChannel {
    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for CaptureChannel {
    async fn send(
        &self,
        alert: &AlertEvent,
        _context: &NotificationContext,
    ) -> climon_notify::Result<()> {
        self.events.lock().unwrap().push(alert.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "capture"
    }
}

pub struct TestContext {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub channel: Arc<CaptureChannel>,
    pub manager: Arc<AlertManager>,
}

pub fn build_test_context() -> Result<TestContext> {
    build_test_context_with(AlertConfig::default())
}

pub fn build_test_context_with(config: AlertConfig) -> Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let store = Arc::new(SqliteStore::open(&temp_dir.path().join("climon.db"))?);
    let channel = Arc::new(CaptureChannel::default());
    let manager = Arc::new(AlertManager::new(config, store.clone(), channel.clone()));
    Ok(TestContext {
        temp_dir,
        store,
        channel,
        manager,
    })
}

pub fn reading(temperature: f64, humidity: f64) -> Vec<u8> {
    serde_json::json!({ "temperature": temperature, "humidity": humidity })
        .to_string()
        .into_bytes()
}
