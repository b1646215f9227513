use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Rarity tier of a collectible, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// Tuning constants attached to each rarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RarityProfile {
    /// Incubation time from laying to hatch readiness.
    pub hatch_duration: Duration,
    /// Boost units that mature an egg instantly.
    pub acceleration_cost: u32,
    /// Weight in the rarity roll before duration bonuses.
    pub base_weight: u32,
    pub label: &'static str,
    pub color: &'static str,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Legendary,
    ];

    pub fn profile(self) -> RarityProfile {
        match self {
            Rarity::Common => RarityProfile {
                hatch_duration: Duration::minutes(30),
                acceleration_cost: 1,
                base_weight: 60,
                label: "Common",
                color: "#8B9467",
            },
            Rarity::Uncommon => RarityProfile {
                hatch_duration: Duration::hours(2),
                acceleration_cost: 1,
                base_weight: 25,
                label: "Uncommon",
                color: "#4A90A4",
            },
            Rarity::Rare => RarityProfile {
                hatch_duration: Duration::hours(6),
                acceleration_cost: 2,
                base_weight: 12,
                label: "Rare",
                color: "#9B59B6",
            },
            Rarity::Legendary => RarityProfile {
                hatch_duration: Duration::hours(12),
                acceleration_cost: 3,
                base_weight: 3,
                label: "Legendary",
                color: "#E67E22",
            },
        }
    }

    pub fn hatch_duration(self) -> Duration {
        self.profile().hatch_duration
    }

    pub fn acceleration_cost(self) -> u32 {
        self.profile().acceleration_cost
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rarity::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown rarity '{s}'"))
    }
}

/// Food category linking a session to compatible catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffinityTag {
    Seed,
    Fruit,
    Biscuit,
}

impl AffinityTag {
    pub const ALL: [AffinityTag; 3] = [AffinityTag::Seed, AffinityTag::Fruit, AffinityTag::Biscuit];

    pub fn as_str(self) -> &'static str {
        match self {
            AffinityTag::Seed => "seed",
            AffinityTag::Fruit => "fruit",
            AffinityTag::Biscuit => "biscuit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AffinityTag::Seed => "Attracts small field birds",
            AffinityTag::Fruit => "Attracts tropical forest birds",
            AffinityTag::Biscuit => "Attracts parrots and intelligent birds",
        }
    }
}

impl fmt::Display for AffinityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AffinityTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AffinityTag::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown affinity '{s}'"))
    }
}
