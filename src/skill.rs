//! The curtain skill entry point
//!
//! The host runtime drives a skill in two passes: first every registered
//! skill scores its claim on the incoming intent ([`CurtainSkill::evaluate`]),
//! then the winner executes it ([`CurtainSkill::handle`]). Handling never
//! propagates an error to the host; every failure becomes a user-facing
//! reply.

use crate::certainty::{self, CertaintyScore};
use crate::config::SkillConfig;
use crate::dispatch::{ActionDispatcher, CommandSink, DispatchResult};
use crate::error::{Result, SkillError};
use crate::intent::{CurtainAction, Intent, ResolvedTarget};
use crate::registry::{DeviceRegistry, DeviceStore};
use crate::resolver;
use crate::response::ResponseComposer;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reply returned to the host after handling an intent
#[derive(Debug, Clone)]
pub struct SkillReply {
    /// Dispatch outcome; `None` when handling aborted before any device
    /// was addressed (e.g. the device cache was unavailable)
    pub result: Option<DispatchResult>,

    /// Rendered natural-language reply
    pub text: String,
}

/// Skill for controlling curtains and blinds
///
/// Owns the device registry cache and the collaborator handles; safe to
/// share across concurrently handled intents.
pub struct CurtainSkill {
    config: SkillConfig,
    registry: Arc<DeviceRegistry>,
    dispatcher: ActionDispatcher,
    composer: ResponseComposer,
}

impl CurtainSkill {
    /// Create the skill over its collaborators
    pub fn new(
        config: SkillConfig,
        store: Arc<dyn DeviceStore>,
        sink: Arc<dyn CommandSink>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(DeviceRegistry::new(
            store,
            config.cache_ttl,
            config.staleness_ceiling,
        ));
        let dispatcher = ActionDispatcher::new(registry.clone(), sink, config.clone());
        Ok(Self {
            config,
            registry,
            dispatcher,
            composer: ResponseComposer,
        })
    }

    /// Usage description for the host's help surface
    pub fn help_text() -> &'static str {
        "The curtain skill can be used in the following ways:\n\
         - \"Open the curtain\" to open a curtain.\n\
         - \"Close the curtain\" to close a curtain.\n\
         - \"Set curtain to 50\" to set the curtain to 50%."
    }

    /// Shared handle to the device registry cache
    pub fn registry(&self) -> Arc<DeviceRegistry> {
        self.registry.clone()
    }

    /// First pass: how strongly this skill claims the intent
    ///
    /// Deterministic for identical inputs against the same device
    /// snapshot. A cache failure is surfaced to the host, which treats the
    /// skill as unable to claim.
    pub async fn evaluate(&self, intent: &Intent) -> Result<CertaintyScore> {
        let resolved = self.resolve(intent).await?;
        let score = certainty::score(intent, &resolved);
        debug!(
            action = %intent.action,
            tier = ?resolved.tier,
            devices = resolved.devices.len(),
            %score,
            "Evaluated intent certainty"
        );
        Ok(score)
    }

    /// Second pass: execute the intent and render the reply
    ///
    /// Never returns an error; failures map to a user-facing reply.
    pub async fn handle(&self, intent: &Intent) -> SkillReply {
        match self.try_handle(intent).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Intent handling failed: {e}");
                let text = match e {
                    SkillError::CacheUnavailable(_) => {
                        "Sorry, I can't reach the curtain system right now.".to_string()
                    }
                    _ => "Sorry, I couldn't process your request.".to_string(),
                };
                SkillReply { result: None, text }
            }
        }
    }

    async fn try_handle(&self, intent: &Intent) -> Result<SkillReply> {
        if !intent.action.is_recognized() {
            return Ok(SkillReply {
                result: None,
                text: "I'm not sure how to handle that request.".to_string(),
            });
        }

        // A set request without a position is answered with a question
        // instead of a guess.
        if intent.action == CurtainAction::SetPosition && intent.position.is_none() {
            return Ok(SkillReply {
                result: None,
                text: "What position would you like to set the curtains to?".to_string(),
            });
        }

        let resolved = self.resolve(intent).await?;
        let result = self.dispatcher.dispatch(intent, &resolved).await?;
        let text = self.composer.compose(&result, intent);
        info!(
            action = %intent.action,
            devices = result.outcomes().len(),
            "Handled curtain intent"
        );
        Ok(SkillReply {
            result: Some(result),
            text,
        })
    }

    async fn resolve(&self, intent: &Intent) -> Result<ResolvedTarget> {
        let devices = self.registry.list(None).await?;
        Ok(resolver::resolve(
            &intent.mentions,
            intent.origin_room.as_deref(),
            &devices,
            self.config.fuzzy_threshold,
        ))
    }
}
