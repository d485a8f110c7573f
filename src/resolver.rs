//! Entity resolution: matching free-text mentions to registry devices
//!
//! Matching is tiered: exact device name, exact room label, the "all"
//! keyword, then fuzzy token overlap. All functions here are pure and
//! non-suspending; the caller supplies the device snapshot from the
//! registry cache.
//!
//! Fuzzy similarity is the token-overlap coefficient: shared normalized
//! tokens divided by the smaller token set, so a one-word mention like
//! "curtain" scores 1.0 against every device with "curtain" in its name
//! and ties are surfaced to the caller as an ambiguous result.

use crate::intent::{MatchTier, ResolvedTarget};
use crate::registry::CurtainDevice;
use std::collections::HashMap;
use tracing::debug;

/// Mentions that address every known device
const ALL_KEYWORDS: &[&str] = &["all", "every", "everything", "alle", "jede", "überall"];

/// Resolve entity mentions against a device snapshot
///
/// When `mentions` is empty the originating room is used as a room match,
/// so "close the curtains" spoken in the kitchen targets the kitchen.
/// No match at any tier yields an empty target, not an error.
pub fn resolve(
    mentions: &[String],
    origin_room: Option<&str>,
    devices: &[CurtainDevice],
    fuzzy_threshold: f32,
) -> ResolvedTarget {
    let fallback;
    let effective: &[String] = if mentions.is_empty() {
        match origin_room {
            Some(room) => {
                fallback = [room.to_string()];
                &fallback
            }
            None => return ResolvedTarget::empty(),
        }
    } else {
        mentions
    };

    let mut matched: HashMap<&str, &CurtainDevice> = HashMap::new();
    let mut tier = MatchTier::None;

    for mention in effective {
        let (mention_tier, hits) = resolve_mention(mention, devices, fuzzy_threshold);
        debug!(mention = %mention, tier = ?mention_tier, hits = hits.len(), "Resolved mention");
        for device in hits {
            matched.insert(device.key.as_str(), device);
        }
        tier = tier.max(mention_tier);
    }

    let mut devices: Vec<_> = matched.into_values().cloned().collect();
    devices.sort_by(|a, b| a.key.cmp(&b.key));
    ResolvedTarget { devices, tier }
}

fn resolve_mention<'a>(
    mention: &str,
    devices: &'a [CurtainDevice],
    fuzzy_threshold: f32,
) -> (MatchTier, Vec<&'a CurtainDevice>) {
    let needle = mention.trim();

    let exact: Vec<_> = devices
        .iter()
        .filter(|d| d.name.eq_ignore_ascii_case(needle))
        .collect();
    if !exact.is_empty() {
        return (MatchTier::ExactName, exact);
    }

    let by_room: Vec<_> = devices
        .iter()
        .filter(|d| d.room.eq_ignore_ascii_case(needle))
        .collect();
    if !by_room.is_empty() {
        return (MatchTier::Room, by_room);
    }

    let lowered = needle.to_lowercase();
    if ALL_KEYWORDS.contains(&lowered.as_str()) {
        return (MatchTier::All, devices.iter().collect());
    }

    // Fuzzy tier: rank by similarity, return every device tied at the top
    // score above the threshold.
    let scored: Vec<(f32, &CurtainDevice)> = devices
        .iter()
        .map(|d| (similarity(needle, &d.name), d))
        .filter(|(score, _)| *score >= fuzzy_threshold)
        .collect();
    let best = scored
        .iter()
        .map(|(score, _)| *score)
        .fold(0.0_f32, f32::max);
    if best > 0.0 {
        let hits = scored
            .into_iter()
            .filter(|(score, _)| (*score - best).abs() < f32::EPSILON)
            .map(|(_, d)| d)
            .collect();
        return (MatchTier::Fuzzy, hits);
    }

    (MatchTier::None, Vec::new())
}

/// Token-overlap similarity between two phrases, in [0.0, 1.0]
pub fn similarity(a: &str, b: &str) -> f32 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let shared = tokens_a
        .iter()
        .filter(|ta| tokens_b.iter().any(|tb| tokens_match(ta, tb)))
        .count();
    shared as f32 / tokens_a.len().min(tokens_b.len()) as f32
}

/// Lowercased alphanumeric tokens of a phrase
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Token equality, tolerant of trailing inflection ("curtains"/"curtain")
fn tokens_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (longer, shorter) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    shorter.len() >= 4 && longer.starts_with(shorter)
}
