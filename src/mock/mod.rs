//! Mock implementations for testing
//!
//! In-memory stand-ins for the durable store and the device driver,
//! with command history and failure simulation for assertions.

use crate::dispatch::{CommandSink, CurtainCommand};
use crate::error::{Result, SkillError};
use crate::registry::{CurtainDevice, DeviceStore, MotionState};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock device store backed by an in-memory row map
pub struct MockDeviceStore {
    rows: Arc<RwLock<HashMap<String, CurtainDevice>>>,
    load_count: Arc<RwLock<usize>>,
    fail_loads: Arc<RwLock<bool>>,
}

impl MockDeviceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            load_count: Arc::new(RwLock::new(0)),
            fail_loads: Arc::new(RwLock::new(false)),
        }
    }

    /// Create a store seeded with devices
    pub fn with_devices(devices: Vec<CurtainDevice>) -> Self {
        let rows = devices.into_iter().map(|d| (d.key.clone(), d)).collect();
        Self {
            rows: Arc::new(RwLock::new(rows)),
            load_count: Arc::new(RwLock::new(0)),
            fail_loads: Arc::new(RwLock::new(false)),
        }
    }

    /// Insert or replace a row
    pub async fn put(&self, device: CurtainDevice) {
        self.rows.write().await.insert(device.key.clone(), device);
    }

    /// Simulate an unreachable store
    pub async fn set_fail_loads(&self, fail: bool) {
        *self.fail_loads.write().await = fail;
    }

    /// Number of load calls served
    pub async fn load_count(&self) -> usize {
        *self.load_count.read().await
    }

    /// Current row state for a key
    pub async fn row(&self, key: &str) -> Option<CurtainDevice> {
        self.rows.read().await.get(key).cloned()
    }
}

impl Default for MockDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceStore for MockDeviceStore {
    async fn load_devices(&self) -> Result<Vec<CurtainDevice>> {
        *self.load_count.write().await += 1;
        if *self.fail_loads.read().await {
            return Err(SkillError::storage("Simulated store outage"));
        }
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn persist_state(
        &self,
        key: &str,
        position: Option<u8>,
        motion: MotionState,
    ) -> Result<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(key)
            .ok_or_else(|| SkillError::not_found(format!("No row for {key}")))?;
        if position.is_some() {
            row.position = position;
        }
        row.motion = motion;
        Ok(())
    }
}

/// Mock command sink recording every issued command
pub struct MockCommandSink {
    history: Arc<RwLock<Vec<(String, CurtainCommand)>>>,
    failing_devices: Arc<RwLock<HashSet<String>>>,
}

impl MockCommandSink {
    /// Create a sink that accepts everything
    pub fn new() -> Self {
        Self {
            history: Arc::new(RwLock::new(Vec::new())),
            failing_devices: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Make commands to one device fail
    pub async fn fail_device(&self, key: &str) {
        self.failing_devices.write().await.insert(key.to_string());
    }

    /// All commands issued so far
    pub async fn history(&self) -> Vec<(String, CurtainCommand)> {
        self.history.read().await.clone()
    }

    /// Commands issued to one device
    pub async fn commands_for(&self, key: &str) -> Vec<CurtainCommand> {
        self.history
            .read()
            .await
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, c)| *c)
            .collect()
    }
}

impl Default for MockCommandSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandSink for MockCommandSink {
    async fn send_command(&self, device_key: &str, command: &CurtainCommand) -> Result<()> {
        if self.failing_devices.read().await.contains(device_key) {
            return Err(SkillError::device_command_failed(format!(
                "Simulated driver failure for {device_key}"
            )));
        }
        self.history
            .write()
            .await
            .push((device_key.to_string(), *command));
        Ok(())
    }
}
