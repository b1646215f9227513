//! Persisted progression entities.
//!
//! Every timestamp is stored as epoch milliseconds so the gateway can filter
//! and order on it numerically.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{AffinityTag, Rarity};

pub const SESSIONS: &str = "sessions";
pub const EGGS: &str = "eggs";
pub const COLLECTIBLES: &str = "collectibles";
pub const OWNERS: &str = "owners";

/// Origin session id recorded on eggs created by admin tools.
pub const ADMIN_ORIGIN: &str = "admin";

/// Counter value at which a hatchling becomes a juvenile.
pub const JUVENILE_AT: u32 = 5;
/// Counter value at which a juvenile becomes an adult.
pub const ADULT_AT: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Hatchling,
    Juvenile,
    Adult,
}

impl Stage {
    /// Stage justified by a growth counter.
    pub fn for_sessions(sessions: u32) -> Self {
        if sessions >= ADULT_AT {
            Stage::Adult
        } else if sessions >= JUVENILE_AT {
            Stage::Juvenile
        } else {
            Stage::Hatchling
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Hatchling => "hatchling",
            Stage::Juvenile => "juvenile",
            Stage::Adult => "adult",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed focus run. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub owner: String,
    pub duration_minutes: u32,
    pub affinity: AffinityTag,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub reward_count: u32,
}

/// A pending reward waiting for its hatch deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Egg {
    pub id: String,
    pub owner: String,
    pub catalog_ref: String,
    pub rarity: Rarity,
    pub affinity: AffinityTag,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Only ever moves earlier.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub hatch_at: DateTime<Utc>,
    pub hatched: bool,
    pub origin_session_id: String,
}

impl Egg {
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.hatch_at <= now
    }

    /// Time left until the egg may hatch, zero once ready.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.hatch_at - now).max(Duration::zero())
    }

    /// Boost units needed to make the egg ready right now.
    pub fn boosts_to_hatch(&self, now: DateTime<Utc>, credit: Duration) -> u32 {
        let remaining = self.remaining(now);
        if remaining.is_zero() {
            return 0;
        }
        let cost = self.rarity.acceleration_cost();
        let credit_ms = credit.num_milliseconds();
        if credit_ms <= 0 {
            return cost;
        }
        let by_credit = remaining.num_milliseconds().div_euclid(credit_ms)
            + i64::from(remaining.num_milliseconds() % credit_ms != 0);
        u32::try_from(by_credit).map_or(cost, |n| n.min(cost))
    }
}

/// A hatched collectible that grows with every completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCollectible {
    pub id: String,
    pub owner: String,
    pub catalog_ref: String,
    pub rarity: Rarity,
    pub stage: Stage,
    pub sessions_with_collectible: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub collected_at: DateTime<Utc>,
    #[serde(default)]
    pub nickname: Option<String>,
    pub origin_egg_id: String,
}

impl OwnedCollectible {
    /// Progress toward the next stage, in percent.
    pub fn stage_progress_pct(&self) -> f64 {
        let n = f64::from(self.sessions_with_collectible);
        match self.stage {
            Stage::Hatchling => (n / f64::from(JUVENILE_AT) * 100.0).min(100.0),
            Stage::Juvenile => {
                let span = f64::from(ADULT_AT - JUVENILE_AT);
                ((n - f64::from(JUVENILE_AT)) / span * 100.0).clamp(0.0, 100.0)
            }
            Stage::Adult => 100.0,
        }
    }

    pub fn display_name<'a>(&'a self, species_name: &'a str) -> &'a str {
        self.nickname.as_deref().unwrap_or(species_name)
    }
}

/// Cumulative per-owner counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerStats {
    pub owner: String,
    #[serde(default)]
    pub total_focus_minutes: u64,
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub eggs_hatched: u64,
}

impl OwnerStats {
    pub fn empty(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            ..Self::default()
        }
    }
}

/// Counter change applied to one collectible by a growth step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthChange {
    pub collectible_id: String,
    pub sessions_with_collectible: u32,
    pub from: Stage,
    pub to: Stage,
}

impl GrowthChange {
    /// Growth never regresses, so a differing stage is always a step forward.
    pub fn for_collectible(collectible: &OwnedCollectible) -> Self {
        let sessions = collectible.sessions_with_collectible.saturating_add(1);
        Self {
            collectible_id: collectible.id.clone(),
            sessions_with_collectible: sessions,
            from: collectible.stage,
            to: collectible.stage.max(Stage::for_sessions(sessions)),
        }
    }

    pub fn is_stage_change(&self) -> bool {
        self.from != self.to
    }
}

/// Everything one completed session produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session: Session,
    pub eggs: Vec<Egg>,
    pub growth: Vec<GrowthChange>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, min, 0).unwrap()
    }

    fn egg(rarity: Rarity, hatch_at: DateTime<Utc>) -> Egg {
        Egg {
            id: "egg-1".into(),
            owner: "ana".into(),
            catalog_ref: "sabia".into(),
            rarity,
            affinity: AffinityTag::Fruit,
            created_at: at(8, 0),
            hatch_at,
            hatched: false,
            origin_session_id: "s1".into(),
        }
    }

    fn collectible(stage: Stage, sessions: u32) -> OwnedCollectible {
        OwnedCollectible {
            id: "c1".into(),
            owner: "ana".into(),
            catalog_ref: "sabia".into(),
            rarity: Rarity::Common,
            stage,
            sessions_with_collectible: sessions,
            collected_at: at(9, 0),
            nickname: None,
            origin_egg_id: "egg-1".into(),
        }
    }

    #[test]
    fn stage_thresholds() {
        assert_eq!(Stage::for_sessions(0), Stage::Hatchling);
        assert_eq!(Stage::for_sessions(4), Stage::Hatchling);
        assert_eq!(Stage::for_sessions(5), Stage::Juvenile);
        assert_eq!(Stage::for_sessions(14), Stage::Juvenile);
        assert_eq!(Stage::for_sessions(15), Stage::Adult);
        assert_eq!(Stage::for_sessions(u32::MAX), Stage::Adult);
    }

    #[test]
    fn growth_crosses_threshold() {
        let change = GrowthChange::for_collectible(&collectible(Stage::Hatchling, 4));
        assert_eq!(change.sessions_with_collectible, 5);
        assert_eq!(change.to, Stage::Juvenile);
        assert!(change.is_stage_change());

        let change = GrowthChange::for_collectible(&collectible(Stage::Juvenile, 5));
        assert!(!change.is_stage_change());
    }

    #[test]
    fn growth_never_regresses_a_stored_stage() {
        let change = GrowthChange::for_collectible(&collectible(Stage::Adult, 0));
        assert_eq!(change.to, Stage::Adult);
    }

    proptest! {
        #[test]
        fn repeated_growth_is_monotonic(start in 0u32..40, steps in 1usize..30) {
            let mut c = collectible(Stage::for_sessions(start), start);
            for _ in 0..steps {
                let change = GrowthChange::for_collectible(&c);
                prop_assert!(change.sessions_with_collectible > c.sessions_with_collectible);
                prop_assert!(change.to >= c.stage);
                prop_assert_eq!(change.to, Stage::for_sessions(change.sessions_with_collectible));
                c.sessions_with_collectible = change.sessions_with_collectible;
                c.stage = change.to;
            }
        }
    }

    #[test]
    fn egg_readiness_and_remaining() {
        let e = egg(Rarity::Rare, at(14, 0));
        assert!(!e.is_ready(at(13, 59)));
        assert!(e.is_ready(at(14, 0)));
        assert_eq!(e.remaining(at(12, 30)), Duration::minutes(90));
        assert_eq!(e.remaining(at(15, 0)), Duration::zero());
    }

    #[test]
    fn boosts_capped_by_rarity_cost() {
        let credit = Duration::minutes(60);
        let rare = egg(Rarity::Rare, at(14, 0));
        assert_eq!(rare.boosts_to_hatch(at(13, 30), credit), 1);
        assert_eq!(rare.boosts_to_hatch(at(8, 0), credit), 2);
        assert_eq!(rare.boosts_to_hatch(at(14, 0), credit), 0);

        let legendary = egg(Rarity::Legendary, at(20, 0));
        assert_eq!(legendary.boosts_to_hatch(at(8, 0), credit), 3);
        assert_eq!(legendary.boosts_to_hatch(at(18, 0), credit), 2);
    }

    #[test]
    fn stage_progress() {
        assert_eq!(collectible(Stage::Hatchling, 0).stage_progress_pct(), 0.0);
        assert_eq!(collectible(Stage::Hatchling, 2).stage_progress_pct(), 40.0);
        assert_eq!(collectible(Stage::Juvenile, 10).stage_progress_pct(), 50.0);
        assert_eq!(collectible(Stage::Adult, 30).stage_progress_pct(), 100.0);
    }

    #[test]
    fn timestamps_persist_as_millis() {
        let e = egg(Rarity::Common, at(8, 30));
        let value = serde_json::to_value(&e).unwrap();
        assert_eq!(value["hatch_at"], serde_json::json!(at(8, 30).timestamp_millis()));
        assert_eq!(value["rarity"], "common");
        let back: Egg = serde_json::from_value(value).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn nickname_overrides_species_name() {
        let mut c = collectible(Stage::Hatchling, 0);
        assert_eq!(c.display_name("Sabiá"), "Sabiá");
        c.nickname = Some("Pipoca".into());
        assert_eq!(c.display_name("Sabiá"), "Pipoca");
    }
}
