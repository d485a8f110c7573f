//! Device registry cache backed by a durable store
//!
//! The registry is the only shared mutable state in the skill: an in-memory,
//! TTL-bounded mirror of the curtain devices known to the durable store.
//! Reads refresh lazily on staleness; mutations go through [`DeviceRegistry::update`]
//! and are persisted best-effort. A refresh loads rows outside the write
//! lock and merges under it, keeping any in-cache entry that was mutated
//! after the loaded row's timestamp.

use crate::error::{Result, SkillError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Characters forbidden in a device control topic: wildcards, whitespace,
/// control characters
static TOPIC_FORBIDDEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[$#+\s\x00-\x1f]").unwrap());

/// Maximum control topic length
const MAX_TOPIC_LEN: usize = 128;

/// Motion state of a curtain device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MotionState {
    /// At rest at its current position
    Idle,
    /// Traveling toward fully open
    Opening,
    /// Traveling toward fully closed
    Closing,
    /// Halted mid-transit by a stop command
    Stopped,
}

impl MotionState {
    /// Whether the device is currently traveling
    pub fn is_moving(&self) -> bool {
        matches!(self, MotionState::Opening | MotionState::Closing)
    }
}

impl std::fmt::Display for MotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MotionState::Idle => "idle",
            MotionState::Opening => "opening",
            MotionState::Closing => "closing",
            MotionState::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// Control channel of a device: the topic commands are published to and the
/// wire payloads the device understands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandChannel {
    /// Control topic
    pub topic: String,

    /// Payload for an open command
    pub payload_open: String,

    /// Payload for a close command
    pub payload_close: String,

    /// Payload for a stop command
    pub payload_stop: String,

    /// Payload template for a set-position command; `{position}` is
    /// substituted with the target percentage
    pub payload_set_template: String,
}

impl CommandChannel {
    /// Create a channel with the default JSON payloads
    pub fn new(topic: impl Into<String>) -> Result<Self> {
        let channel = Self {
            topic: topic.into().trim().to_string(),
            payload_open: r#"{"state": "OPEN"}"#.to_string(),
            payload_close: r#"{"state": "CLOSE"}"#.to_string(),
            payload_stop: r#"{"state": "STOP"}"#.to_string(),
            payload_set_template: r#"{"position": {position}}"#.to_string(),
        };
        channel.validate_topic()?;
        Ok(channel)
    }

    /// Validate the control topic against transport constraints
    pub fn validate_topic(&self) -> Result<()> {
        if TOPIC_FORBIDDEN.is_match(&self.topic) {
            return Err(SkillError::invalid_input(format!(
                "Topic '{}' must not contain '+', '#', '$', whitespace, or control characters",
                self.topic
            )));
        }
        if self.topic.is_empty() {
            return Err(SkillError::invalid_input("Topic must not be empty"));
        }
        if self.topic.len() > MAX_TOPIC_LEN {
            return Err(SkillError::invalid_input(format!(
                "Topic length exceeds maximum allowed limit ({MAX_TOPIC_LEN} characters)"
            )));
        }
        Ok(())
    }

    /// Render the wire payload for a position target
    pub fn render_set(&self, position: u8) -> String {
        self.payload_set_template
            .replace("{position}", &position.to_string())
    }
}

/// A curtain device as known to the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurtainDevice {
    /// Stable device identifier
    pub key: String,

    /// Human-readable name
    pub name: String,

    /// Room/zone label
    pub room: String,

    /// Device type (e.g. "curtain", "jalousie")
    pub device_type: String,

    /// Percent open, 0 = closed, 100 = fully open; `None` when unknown
    pub position: Option<u8>,

    /// Current motion state
    pub motion: MotionState,

    /// Timestamp of the last state change
    pub last_updated: DateTime<Utc>,

    /// Control channel
    pub channel: CommandChannel,
}

impl CurtainDevice {
    /// Create a device with unknown position, idle, updated now
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        room: impl Into<String>,
        channel: CommandChannel,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            room: room.into(),
            device_type: "curtain".to_string(),
            position: None,
            motion: MotionState::Idle,
            last_updated: Utc::now(),
            channel,
        }
    }
}

/// Durable storage collaborator for device registry rows
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Load all device rows
    async fn load_devices(&self) -> Result<Vec<CurtainDevice>>;

    /// Persist the state of one device
    async fn persist_state(
        &self,
        key: &str,
        position: Option<u8>,
        motion: MotionState,
    ) -> Result<()>;
}

#[derive(Debug, Default)]
struct RegistryInner {
    devices: HashMap<String, CurtainDevice>,
    last_refresh: Option<DateTime<Utc>>,
}

/// In-memory, TTL-bounded mirror of the device store
pub struct DeviceRegistry {
    store: Arc<dyn DeviceStore>,
    inner: Arc<RwLock<RegistryInner>>,
    cache_ttl: Duration,
    staleness_ceiling: Duration,
}

impl DeviceRegistry {
    /// Create a registry over a store; the cache starts empty and the first
    /// read triggers a refresh
    pub fn new(store: Arc<dyn DeviceStore>, cache_ttl: Duration, staleness_ceiling: Duration) -> Self {
        Self {
            store,
            inner: Arc::new(RwLock::new(RegistryInner::default())),
            cache_ttl,
            staleness_ceiling,
        }
    }

    /// Get a device by key, refreshing the cache if stale
    pub async fn get(&self, key: &str) -> Result<CurtainDevice> {
        self.ensure_fresh().await?;
        let inner = self.inner.read().await;
        inner
            .devices
            .get(key)
            .cloned()
            .ok_or_else(|| SkillError::not_found(format!("Device not found: {key}")))
    }

    /// List devices, optionally filtered by room (case-insensitive),
    /// refreshing the cache if stale
    pub async fn list(&self, room_filter: Option<&str>) -> Result<Vec<CurtainDevice>> {
        self.ensure_fresh().await?;
        let inner = self.inner.read().await;
        let mut devices: Vec<_> = inner
            .devices
            .values()
            .filter(|device| match room_filter {
                Some(room) => device.room.eq_ignore_ascii_case(room),
                None => true,
            })
            .cloned()
            .collect();
        devices.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(devices)
    }

    /// Reload all devices from the store, replacing the cache atomically
    ///
    /// Rows older than an in-cache entry are discarded so a slow refresh
    /// never overwrites state written through [`update`](Self::update)
    /// while the store call was in flight.
    pub async fn refresh(&self) -> Result<()> {
        // Store I/O happens outside the lock; readers are never blocked on it.
        let rows = self
            .store
            .load_devices()
            .await
            .map_err(|e| SkillError::storage(format!("Device load failed: {e}")))?;

        let mut fresh = HashMap::with_capacity(rows.len());
        for row in rows {
            if let Err(e) = row.channel.validate_topic() {
                warn!(device = %row.key, "Skipping device with invalid topic: {e}");
                continue;
            }
            fresh.insert(row.key.clone(), row);
        }

        let mut inner = self.inner.write().await;
        for (key, cached) in inner.devices.iter() {
            if let Some(row) = fresh.get_mut(key) {
                if cached.last_updated > row.last_updated {
                    *row = cached.clone();
                }
            }
        }
        debug!(devices = fresh.len(), "Device registry refreshed");
        inner.devices = fresh;
        inner.last_refresh = Some(Utc::now());
        Ok(())
    }

    /// Update the cached state of one device and persist it
    pub async fn update(&self, key: &str, position: Option<u8>, motion: MotionState) -> Result<()> {
        if let Some(pos) = position {
            if pos > 100 {
                return Err(SkillError::InvalidPosition(pos as i64));
            }
        }

        self.ensure_fresh().await?;

        {
            let mut inner = self.inner.write().await;
            let device = inner
                .devices
                .get_mut(key)
                .ok_or_else(|| SkillError::not_found(format!("Device not found: {key}")))?;
            if position.is_some() {
                device.position = position;
            }
            device.motion = motion;
            device.last_updated = Utc::now();
        }

        // Persistence is best-effort: the in-memory state is authoritative
        // until the next refresh.
        if let Err(e) = self.store.persist_state(key, position, motion).await {
            warn!(device = %key, "Failed to persist device state: {e}");
        }
        Ok(())
    }

    /// Age of the cached data, or `None` before the first refresh
    pub async fn age(&self) -> Option<Duration> {
        let inner = self.inner.read().await;
        inner
            .last_refresh
            .map(|t| (Utc::now() - t).to_std().unwrap_or_default())
    }

    async fn ensure_fresh(&self) -> Result<()> {
        let age = self.age().await;
        let stale = match age {
            Some(age) => age > self.cache_ttl,
            None => true,
        };
        if !stale {
            return Ok(());
        }

        match self.refresh().await {
            Ok(()) => Ok(()),
            Err(e) => match age {
                // Within the staleness ceiling a failed refresh degrades to
                // serving stale data.
                Some(age) if age <= self.staleness_ceiling => {
                    warn!("Serving stale device data ({}s old): {e}", age.as_secs());
                    Ok(())
                }
                _ => Err(SkillError::cache_unavailable(format!(
                    "Device store unreachable and cache exceeded staleness ceiling: {e}"
                ))),
            },
        }
    }
}
