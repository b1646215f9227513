//! Reward roller: turns a focus duration into eggs.
//!
//! All functions are pure given a random source. [`RewardRoller`] wraps a
//! seedable PCG generator so tests and replays can fix the outcome.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::catalog::{AffinityTag, Catalog, CatalogEntry, Rarity};
use crate::error::CatalogError;

/// Sessions shorter than this earn nothing.
pub const MIN_REWARD_MINUTES: u32 = 15;

/// Number of eggs earned by a session of `minutes`.
pub fn reward_count(minutes: u32) -> u32 {
    match minutes {
        m if m < MIN_REWARD_MINUTES => 0,
        m if m <= 30 => 1,
        m if m <= 60 => 2,
        _ => 3,
    }
}

/// Roll weights per rarity for one duration bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityWeights {
    pub common: u32,
    pub uncommon: u32,
    pub rare: u32,
    pub legendary: u32,
}

impl RarityWeights {
    pub fn base() -> Self {
        Self {
            common: Rarity::Common.profile().base_weight,
            uncommon: Rarity::Uncommon.profile().base_weight,
            rare: Rarity::Rare.profile().base_weight,
            legendary: Rarity::Legendary.profile().base_weight,
        }
    }

    /// Base weights plus the cumulative long-session bonuses.
    pub fn for_duration(minutes: u32) -> Self {
        let mut w = Self::base();
        if minutes > 30 {
            w.uncommon += 10;
            w.rare += 5;
            w.legendary += 2;
        }
        if minutes > 60 {
            w.rare += 10;
            w.legendary += 5;
        }
        if minutes > 90 {
            w.legendary += 10;
        }
        w
    }

    pub fn weight(&self, rarity: Rarity) -> u32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Legendary => self.legendary,
        }
    }

    pub fn total(&self) -> u32 {
        self.common + self.uncommon + self.rare + self.legendary
    }
}

/// Resolve a roll in `[0, total)` against cumulative thresholds.
///
/// Legendary is checked first, then rare, then uncommon; anything left is
/// common. Test vectors depend on this order.
pub fn rarity_for_roll(weights: &RarityWeights, roll: f64) -> Rarity {
    let legendary = weights.legendary as f64;
    let rare = legendary + weights.rare as f64;
    let uncommon = rare + weights.uncommon as f64;

    if roll < legendary {
        Rarity::Legendary
    } else if roll < rare {
        Rarity::Rare
    } else if roll < uncommon {
        Rarity::Uncommon
    } else {
        Rarity::Common
    }
}

pub fn roll_rarity<R: Rng + ?Sized>(minutes: u32, rng: &mut R) -> Rarity {
    let weights = RarityWeights::for_duration(minutes);
    let roll = rng.gen::<f64>() * weights.total() as f64;
    rarity_for_roll(&weights, roll)
}

/// Uniform pick among entries matching both rarity and affinity, falling
/// back to any entry of the rarity when no affinity match exists.
pub fn pick_catalog_entry<'a, R: Rng + ?Sized>(
    rarity: Rarity,
    affinity: AffinityTag,
    entries: &'a [CatalogEntry],
    rng: &mut R,
) -> Result<&'a CatalogEntry, CatalogError> {
    let matching: Vec<&CatalogEntry> = entries
        .iter()
        .filter(|e| e.rarity == rarity && e.affinity == affinity)
        .collect();
    let candidates = if matching.is_empty() {
        entries.iter().filter(|e| e.rarity == rarity).collect()
    } else {
        matching
    };
    candidates
        .choose(rng)
        .copied()
        .ok_or(CatalogError::MissingRarity(rarity))
}

/// One rolled reward, before it becomes an egg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDraw {
    pub rarity: Rarity,
    pub entry_id: String,
}

/// Seedable reward roller.
#[derive(Debug, Clone)]
pub struct RewardRoller {
    rng: Mcg128Xsl64,
}

impl RewardRoller {
    /// `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self { rng }
    }

    /// Independently roll rarity and species for every reward a session earns.
    pub fn draw(
        &mut self,
        minutes: u32,
        affinity: AffinityTag,
        catalog: &Catalog,
    ) -> Result<Vec<RewardDraw>, CatalogError> {
        (0..reward_count(minutes))
            .map(|_| {
                let rarity = roll_rarity(minutes, &mut self.rng);
                let entry = pick_catalog_entry(rarity, affinity, catalog.entries(), &mut self.rng)?;
                tracing::debug!(minutes, %rarity, entry = %entry.id, "rolled reward");
                Ok(RewardDraw {
                    rarity,
                    entry_id: entry.id.clone(),
                })
            })
            .collect()
    }

    /// Draw `count` rewards of a fixed rarity, skipping duration gating.
    pub fn draw_fixed(
        &mut self,
        count: u32,
        rarity: Rarity,
        affinity: AffinityTag,
        catalog: &Catalog,
    ) -> Result<Vec<RewardDraw>, CatalogError> {
        (0..count)
            .map(|_| {
                let entry = pick_catalog_entry(rarity, affinity, catalog.entries(), &mut self.rng)?;
                Ok(RewardDraw {
                    rarity,
                    entry_id: entry.id.clone(),
                })
            })
            .collect()
    }
}

impl Default for RewardRoller {
    fn default() -> Self {
        Self::new(None)
    }
}
