//! Voice-assistant skill for curtain and blind control
//!
//! This crate implements the decision core of a curtain skill for a
//! voice-assistant runtime: scoring how confidently the skill should claim
//! an incoming intent, resolving free-text room and device mentions
//! against a TTL-cached device registry, driving the per-device motion
//! state machine, and rendering the confirmation reply.
//!
//! Transport, authentication, and the actual device drivers are host
//! collaborators behind the [`registry::DeviceStore`] and
//! [`dispatch::CommandSink`] traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use curtain_skill_rust::{
//!     config::SkillConfig,
//!     intent::{CurtainAction, Intent},
//!     mock::{MockCommandSink, MockDeviceStore},
//!     skill::CurtainSkill,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let skill = CurtainSkill::new(
//!         SkillConfig::from_env()?,
//!         Arc::new(MockDeviceStore::new()),
//!         Arc::new(MockCommandSink::new()),
//!     )?;
//!
//!     let intent = Intent::new(CurtainAction::Open, vec!["living room".to_string()]);
//!     let score = skill.evaluate(&intent).await?;
//!     if score.is_claim() {
//!         let reply = skill.handle(&intent).await;
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod certainty;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod logging;
pub mod mock;
pub mod registry;
pub mod resolver;
pub mod response;
pub mod skill;

// Re-export main types
pub use crate::{
    certainty::CertaintyScore,
    config::{SkillConfig, TransitBehavior},
    dispatch::{CommandSink, CurtainCommand, DispatchResult},
    error::{Result, SkillError},
    intent::{CurtainAction, Intent, MatchTier, ResolvedTarget},
    registry::{CurtainDevice, DeviceRegistry, DeviceStore, MotionState},
    skill::{CurtainSkill, SkillReply},
};
