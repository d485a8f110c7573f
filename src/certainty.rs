//! Certainty scoring: how strongly this skill claims an intent
//!
//! The host runtime polls every skill for a claim strength and awards the
//! intent to the highest scorer. The score is the product of an
//! action-recognition term and an entity-resolution term, so an
//! unrecognized verb or an empty resolution always yields 0.0 no matter
//! how strong the other term is.

use crate::intent::{Intent, MatchTier, ResolvedTarget};
use serde::{Deserialize, Serialize};

/// Resolution term for a fuzzy match: confident enough to claim, below any
/// exact tier
const FUZZY_RESOLUTION_WEIGHT: f32 = 0.6;

/// Claim strength in [0.0, 1.0]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct CertaintyScore(f32);

impl CertaintyScore {
    /// Construct a score, clamping into [0.0, 1.0]
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Raw score value
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Whether this skill claims the intent at all
    pub fn is_claim(&self) -> bool {
        self.0 > 0.0
    }
}

impl std::fmt::Display for CertaintyScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Score an intent against its resolution outcome
///
/// Deterministic: identical inputs always produce the identical score.
pub fn score(intent: &Intent, resolved: &ResolvedTarget) -> CertaintyScore {
    let action_term = if intent.action.is_recognized() { 1.0 } else { 0.0 };

    let resolution_term = if resolved.is_empty() {
        0.0
    } else {
        match resolved.tier {
            MatchTier::ExactName | MatchTier::Room | MatchTier::All => 1.0,
            MatchTier::Fuzzy => FUZZY_RESOLUTION_WEIGHT,
            MatchTier::None => 0.0,
        }
    };

    CertaintyScore::new(action_term * resolution_term)
}
