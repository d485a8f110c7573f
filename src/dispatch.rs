//! Action dispatch: translating a resolved intent into device commands
//!
//! Each device moves through a small motion state machine:
//! `idle → opening → idle`, `idle → closing → idle`,
//! `{opening, closing} → stopped` on stop. Re-issuing the direction a
//! device is already traveling is idempotent and does not reach the
//! driver; the opposite direction supersedes the transit in flight.
//! Set-position is a target-position write; physical transit completion is
//! reported asynchronously by the device driver, outside this crate.
//!
//! Multi-device targets fan out independently: commands are fire-and-forget
//! once issued, and one device failing neither blocks nor rolls back its
//! siblings.

use crate::config::{SkillConfig, TransitBehavior};
use crate::error::{Result, SkillError};
use crate::intent::{Intent, ResolvedTarget};
use crate::registry::{CurtainDevice, DeviceRegistry, MotionState};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Concrete command issued to a device driver
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CurtainCommand {
    Open,
    Close,
    Stop,
    SetPosition(u8),
}

impl std::fmt::Display for CurtainCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Close => write!(f, "close"),
            Self::Stop => write!(f, "stop"),
            Self::SetPosition(p) => write!(f, "set_position({p})"),
        }
    }
}

/// Device driver collaborator
///
/// Implementations own the actual transport (MQTT, HTTP, vendor API).
/// A returned error means the command was not accepted; once `Ok` the
/// command is considered issued and is never retried or rolled back here.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Issue a command to one device
    async fn send_command(&self, device_key: &str, command: &CurtainCommand) -> Result<()>;
}

/// Per-device outcome status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Command issued (or recognized as an idempotent no-op)
    Success,
    /// Requested position outside 0-100; device state untouched
    InvalidPosition,
    /// Driver rejected the command
    Failed(String),
}

/// Outcome of dispatching to one device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceOutcome {
    /// Device key
    pub key: String,

    /// Device name, for response rendering
    pub name: String,

    /// Room label
    pub room: String,

    /// What happened
    pub status: OutcomeStatus,

    /// Motion state after dispatch
    pub motion: MotionState,

    /// Position after dispatch, if known
    pub position: Option<u8>,
}

impl DeviceOutcome {
    /// Whether the command took effect on this device
    pub fn succeeded(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Aggregated outcome of one dispatch call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DispatchResult {
    /// Commands were applied per device
    Executed { outcomes: Vec<DeviceOutcome> },

    /// Several equally-ranked candidates for a singular-target mention;
    /// nothing was executed
    NeedsClarification { candidates: Vec<String> },

    /// No device matched the mentions; nothing was executed
    NoTarget { mentions: Vec<String> },
}

impl DispatchResult {
    /// Per-device outcomes, empty for the non-executed variants
    pub fn outcomes(&self) -> &[DeviceOutcome] {
        match self {
            Self::Executed { outcomes } => outcomes,
            _ => &[],
        }
    }

    /// Whether every device succeeded (and at least one was addressed)
    pub fn all_succeeded(&self) -> bool {
        let outcomes = self.outcomes();
        !outcomes.is_empty() && outcomes.iter().all(DeviceOutcome::succeeded)
    }

    /// Whether every device failed
    pub fn all_failed(&self) -> bool {
        let outcomes = self.outcomes();
        !outcomes.is_empty() && outcomes.iter().all(|o| !o.succeeded())
    }

    /// Whether some but not all devices failed
    pub fn partial_failure(&self) -> bool {
        let outcomes = self.outcomes();
        outcomes.iter().any(DeviceOutcome::succeeded) && outcomes.iter().any(|o| !o.succeeded())
    }

    /// Whether every failure was an out-of-range position
    pub fn all_invalid_position(&self) -> bool {
        let outcomes = self.outcomes();
        !outcomes.is_empty()
            && outcomes
                .iter()
                .all(|o| o.status == OutcomeStatus::InvalidPosition)
    }
}

/// What applying a command to a device would do
#[derive(Debug, Clone, PartialEq, Eq)]
struct TransitionPlan {
    /// Command to issue, `None` when the request is an idempotent no-op
    command: Option<CurtainCommand>,
    /// Motion state after the transition
    motion: MotionState,
    /// Position to write, `None` to leave unchanged
    position: Option<u8>,
}

/// Compute the state transition for a command against the current device
/// state, without side effects
fn plan_transition(
    device: &CurtainDevice,
    command: &CurtainCommand,
    transit: TransitBehavior,
) -> Result<TransitionPlan> {
    match command {
        CurtainCommand::Open => Ok(if device.motion == MotionState::Opening {
            TransitionPlan {
                command: None,
                motion: MotionState::Opening,
                position: None,
            }
        } else {
            TransitionPlan {
                command: Some(CurtainCommand::Open),
                motion: MotionState::Opening,
                position: None,
            }
        }),
        CurtainCommand::Close => Ok(if device.motion == MotionState::Closing {
            TransitionPlan {
                command: None,
                motion: MotionState::Closing,
                position: None,
            }
        } else {
            TransitionPlan {
                command: Some(CurtainCommand::Close),
                motion: MotionState::Closing,
                position: None,
            }
        }),
        CurtainCommand::Stop => Ok(if device.motion.is_moving() {
            TransitionPlan {
                command: Some(CurtainCommand::Stop),
                motion: MotionState::Stopped,
                position: None,
            }
        } else {
            // Stopping a device at rest is a successful no-op.
            TransitionPlan {
                command: None,
                motion: device.motion,
                position: None,
            }
        }),
        CurtainCommand::SetPosition(target) => {
            if *target > 100 {
                return Err(SkillError::InvalidPosition(*target as i64));
            }
            let motion = match transit {
                TransitBehavior::Instantaneous => MotionState::Idle,
                TransitBehavior::Simulated => match device.position {
                    Some(current) if *target > current => MotionState::Opening,
                    Some(current) if *target < current => MotionState::Closing,
                    _ => MotionState::Idle,
                },
            };
            Ok(TransitionPlan {
                command: Some(CurtainCommand::SetPosition(*target)),
                motion,
                position: Some(*target),
            })
        }
    }
}

/// Maps resolved intents to device commands and registry state transitions
pub struct ActionDispatcher {
    registry: Arc<DeviceRegistry>,
    sink: Arc<dyn CommandSink>,
    config: SkillConfig,
}

impl ActionDispatcher {
    /// Create a dispatcher over a registry and a driver sink
    pub fn new(registry: Arc<DeviceRegistry>, sink: Arc<dyn CommandSink>, config: SkillConfig) -> Self {
        Self {
            registry,
            sink,
            config,
        }
    }

    /// Apply the intent's action to every resolved device
    pub async fn dispatch(&self, intent: &Intent, resolved: &ResolvedTarget) -> Result<DispatchResult> {
        if resolved.is_empty() {
            return Ok(DispatchResult::NoTarget {
                mentions: intent.mentions.clone(),
            });
        }

        if resolved.is_ambiguous() {
            return Ok(DispatchResult::NeedsClarification {
                candidates: resolved.devices.iter().map(|d| d.name.clone()).collect(),
            });
        }

        let command = self.command_for(intent)?;
        info!(
            action = %command,
            devices = resolved.devices.len(),
            "Dispatching curtain command"
        );

        let outcomes = join_all(
            resolved
                .devices
                .iter()
                .map(|device| self.dispatch_one(device, &command)),
        )
        .await;

        Ok(DispatchResult::Executed { outcomes })
    }

    fn command_for(&self, intent: &Intent) -> Result<CurtainCommand> {
        use crate::intent::CurtainAction;
        match intent.action {
            CurtainAction::Open => Ok(CurtainCommand::Open),
            CurtainAction::Close => Ok(CurtainCommand::Close),
            CurtainAction::Stop => Ok(CurtainCommand::Stop),
            CurtainAction::SetPosition => intent
                .position
                .map(CurtainCommand::SetPosition)
                .ok_or_else(|| SkillError::invalid_input("set_position intent without a position")),
            CurtainAction::Unknown => {
                Err(SkillError::invalid_input("cannot dispatch an unknown action"))
            }
        }
    }

    /// Dispatch one command to one device; never propagates driver errors,
    /// they become the device's outcome
    async fn dispatch_one(&self, device: &CurtainDevice, command: &CurtainCommand) -> DeviceOutcome {
        let transit = self.config.transit_for(&device.device_type);
        let plan = match plan_transition(device, command, transit) {
            Ok(plan) => plan,
            Err(e) => {
                let status = match e {
                    SkillError::InvalidPosition(_) => OutcomeStatus::InvalidPosition,
                    other => OutcomeStatus::Failed(other.to_string()),
                };
                return DeviceOutcome {
                    key: device.key.clone(),
                    name: device.name.clone(),
                    room: device.room.clone(),
                    status,
                    motion: device.motion,
                    position: device.position,
                };
            }
        };

        let Some(wire_command) = plan.command else {
            debug!(device = %device.key, "Command is a no-op for current state");
            return DeviceOutcome {
                key: device.key.clone(),
                name: device.name.clone(),
                room: device.room.clone(),
                status: OutcomeStatus::Success,
                motion: plan.motion,
                position: device.position,
            };
        };

        let payload = match wire_command {
            CurtainCommand::Open => device.channel.payload_open.clone(),
            CurtainCommand::Close => device.channel.payload_close.clone(),
            CurtainCommand::Stop => device.channel.payload_stop.clone(),
            CurtainCommand::SetPosition(p) => device.channel.render_set(p),
        };
        debug!(
            device = %device.key,
            topic = %device.channel.topic,
            payload = %payload,
            "Issuing device command"
        );

        match self.sink.send_command(&device.key, &wire_command).await {
            Ok(()) => {
                let position = plan.position.or(device.position);
                if let Err(e) = self
                    .registry
                    .update(&device.key, plan.position, plan.motion)
                    .await
                {
                    error!(device = %device.key, "Failed to record device state: {e}");
                }
                DeviceOutcome {
                    key: device.key.clone(),
                    name: device.name.clone(),
                    room: device.room.clone(),
                    status: OutcomeStatus::Success,
                    motion: plan.motion,
                    position,
                }
            }
            Err(e) => {
                error!(device = %device.key, "Device command failed: {e}");
                DeviceOutcome {
                    key: device.key.clone(),
                    name: device.name.clone(),
                    room: device.room.clone(),
                    status: OutcomeStatus::Failed(e.to_string()),
                    motion: device.motion,
                    position: device.position,
                }
            }
        }
    }
}
