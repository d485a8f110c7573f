//! Configuration for the curtain skill
//!
//! All tunables consumed by the skill core: device cache freshness bounds,
//! the fuzzy-match similarity threshold, and per-device-type transit
//! behavior for position commands. The surrounding runtime supplies these
//! from its own configuration source; `from_env` and `from_file` cover the
//! common cases.

use crate::error::{Result, SkillError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{env, time::Duration};

/// How a device models a SET_POSITION command
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransitBehavior {
    /// Target position is written immediately; the device reports no transit
    Instantaneous,
    /// Device travels to the target; motion state reflects the direction
    /// until the driver reports completion
    Simulated,
}

impl Default for TransitBehavior {
    fn default() -> Self {
        Self::Instantaneous
    }
}

/// Skill configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Maximum age of cached device data before a refresh is triggered
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,

    /// Hard ceiling on served data age; a failed refresh past this point
    /// surfaces a cache-unavailable error instead of stale data
    #[serde(with = "humantime_serde")]
    pub staleness_ceiling: Duration,

    /// Minimum token-overlap similarity for a fuzzy entity match, in (0.0, 1.0]
    pub fuzzy_threshold: f32,

    /// Transit behavior overrides keyed by device type
    #[serde(default)]
    pub transit: HashMap<String, TransitBehavior>,

    /// Transit behavior for device types without an override
    #[serde(default)]
    pub default_transit: TransitBehavior,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30),
            staleness_ceiling: Duration::from_secs(300),
            fuzzy_threshold: 0.5,
            transit: HashMap::new(),
            default_transit: TransitBehavior::Instantaneous,
        }
    }
}

impl SkillConfig {
    /// Load configuration from environment variables
    ///
    /// Recognized variables: `CURTAIN_SKILL_CACHE_TTL` and
    /// `CURTAIN_SKILL_STALENESS_CEILING` (seconds),
    /// `CURTAIN_SKILL_FUZZY_THRESHOLD`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(ttl) = env::var("CURTAIN_SKILL_CACHE_TTL") {
            config.cache_ttl = Duration::from_secs(
                ttl.parse()
                    .map_err(|e| SkillError::config(format!("Invalid CURTAIN_SKILL_CACHE_TTL: {e}")))?,
            );
        }

        if let Ok(ceiling) = env::var("CURTAIN_SKILL_STALENESS_CEILING") {
            config.staleness_ceiling = Duration::from_secs(ceiling.parse().map_err(|e| {
                SkillError::config(format!("Invalid CURTAIN_SKILL_STALENESS_CEILING: {e}"))
            })?);
        }

        if let Ok(threshold) = env::var("CURTAIN_SKILL_FUZZY_THRESHOLD") {
            config.fuzzy_threshold = threshold.parse().map_err(|e| {
                SkillError::config(format!("Invalid CURTAIN_SKILL_FUZZY_THRESHOLD: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, with environment overrides
    /// applied on top (`CURTAIN_SKILL_` prefix)
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CURTAIN_SKILL"))
            .build()
            .map_err(|e| SkillError::config(format!("Failed to load {path}: {e}")))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| SkillError::config(format!("Failed to parse {path}: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Transit behavior for a device type
    pub fn transit_for(&self, device_type: &str) -> TransitBehavior {
        self.transit
            .get(device_type)
            .copied()
            .unwrap_or(self.default_transit)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl.is_zero() {
            return Err(SkillError::config("cache_ttl must be greater than zero"));
        }

        if self.staleness_ceiling < self.cache_ttl {
            return Err(SkillError::config(
                "staleness_ceiling must not be smaller than cache_ttl",
            ));
        }

        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(SkillError::config(
                "fuzzy_threshold must be within (0.0, 1.0]",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SkillConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_ttl() {
        let config = SkillConfig {
            cache_ttl: Duration::from_secs(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_ceiling_below_ttl() {
        let config = SkillConfig {
            cache_ttl: Duration::from_secs(60),
            staleness_ceiling: Duration::from_secs(30),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        for threshold in [0.0, -0.2, 1.5] {
            let config = SkillConfig {
                fuzzy_threshold: threshold,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "threshold {threshold} accepted");
        }
    }

    #[test]
    fn transit_override_wins_over_default() {
        let mut config = SkillConfig::default();
        config
            .transit
            .insert("jalousie".to_string(), TransitBehavior::Simulated);

        assert_eq!(config.transit_for("jalousie"), TransitBehavior::Simulated);
        assert_eq!(config.transit_for("curtain"), TransitBehavior::Instantaneous);
    }
}
