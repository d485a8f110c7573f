//! Intent and resolution result types
//!
//! An [`Intent`] is the structured form of a user request, already
//! classified by the host runtime. The skill never parses raw speech; it
//! only normalizes the action verb and matches entity mentions against the
//! device registry.

use crate::registry::CurtainDevice;
use serde::{Deserialize, Serialize};

/// Recognized curtain actions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CurtainAction {
    Open,
    Close,
    Stop,
    SetPosition,
    Unknown,
}

impl CurtainAction {
    /// Normalize a verb from user input (supports German/English)
    pub fn parse(verb: &str) -> Self {
        match verb.to_lowercase().as_str() {
            "open" | "up" | "öffnen" | "hoch" | "rauf" | "auf" => Self::Open,
            "close" | "down" | "schließen" | "runter" | "zu" => Self::Close,
            "stop" | "stopp" | "halt" => Self::Stop,
            "set" | "set_position" | "position" | "pos" => Self::SetPosition,
            _ => Self::Unknown,
        }
    }

    /// Whether this skill can handle the verb at all
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for CurtainAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
            Self::SetPosition => "set_position",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A structured user request, immutable for the lifetime of its handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Classified action verb
    pub action: CurtainAction,

    /// Target position for set-position requests
    pub position: Option<u8>,

    /// Free-text entity mentions (room names, device names, "all")
    pub mentions: Vec<String>,

    /// Room the request originated from; used when no mention names a
    /// room or device
    pub origin_room: Option<String>,
}

impl Intent {
    /// Intent with no position and no origin room
    pub fn new(action: CurtainAction, mentions: Vec<String>) -> Self {
        Self {
            action,
            position: None,
            mentions,
            origin_room: None,
        }
    }

    /// Attach a target position
    pub fn with_position(mut self, position: u8) -> Self {
        self.position = Some(position);
        self
    }

    /// Attach the originating room
    pub fn with_origin_room(mut self, room: impl Into<String>) -> Self {
        self.origin_room = Some(room.into());
        self
    }
}

/// Priority tier an entity mention matched at
///
/// Ordering is by match confidence: `ExactName` outranks `Room`, which
/// outranks `All`, which outranks `Fuzzy`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    None,
    Fuzzy,
    All,
    Room,
    ExactName,
}

impl MatchTier {
    /// Whether a mention at this tier names one specific device, so that
    /// multiple candidates make the result ambiguous
    pub fn implies_single_target(&self) -> bool {
        matches!(self, Self::ExactName | Self::Fuzzy)
    }
}

/// The devices an intent's mentions were matched to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// Matched devices, deduplicated
    pub devices: Vec<CurtainDevice>,

    /// Best tier any mention matched at
    pub tier: MatchTier,
}

impl ResolvedTarget {
    /// An empty resolution
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            tier: MatchTier::None,
        }
    }

    /// Whether no device matched
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Whether the result needs clarification: several equally-ranked
    /// candidates for a mention that names a single device
    pub fn is_ambiguous(&self) -> bool {
        self.devices.len() > 1 && self.tier.implies_single_target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_english_and_german_verbs() {
        assert_eq!(CurtainAction::parse("open"), CurtainAction::Open);
        assert_eq!(CurtainAction::parse("Öffnen"), CurtainAction::Open);
        assert_eq!(CurtainAction::parse("runter"), CurtainAction::Close);
        assert_eq!(CurtainAction::parse("CLOSE"), CurtainAction::Close);
        assert_eq!(CurtainAction::parse("stopp"), CurtainAction::Stop);
        assert_eq!(CurtainAction::parse("position"), CurtainAction::SetPosition);
        assert_eq!(CurtainAction::parse("dance"), CurtainAction::Unknown);
    }

    #[test]
    fn tier_ordering_follows_confidence() {
        assert!(MatchTier::ExactName > MatchTier::Room);
        assert!(MatchTier::Room > MatchTier::All);
        assert!(MatchTier::All > MatchTier::Fuzzy);
        assert!(MatchTier::Fuzzy > MatchTier::None);
    }

    #[test]
    fn single_target_tiers() {
        assert!(MatchTier::ExactName.implies_single_target());
        assert!(MatchTier::Fuzzy.implies_single_target());
        assert!(!MatchTier::Room.implies_single_target());
        assert!(!MatchTier::All.implies_single_target());
    }
}
