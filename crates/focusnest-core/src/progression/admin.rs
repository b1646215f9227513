//! Privileged shortcuts that bypass duration gating and hatch deadlines.
//!
//! Each operation is still a single atomic batch.

use super::model::{Egg, OwnedCollectible, OwnerStats, ADMIN_ORIGIN, OWNERS};
use super::store::{lay_eggs, push_eggs, push_hatch, ProgressionStore};
use crate::catalog::{AffinityTag, Rarity};
use crate::error::{ProgressionError, Result, StoreError};
use crate::gateway::{Document, DocumentStore, WriteBatch};

impl ProgressionStore {
    /// Lay `count` eggs of a fixed rarity that are ready to hatch immediately.
    pub async fn force_generate_eggs(
        &self,
        owner: &str,
        count: u32,
        affinity: AffinityTag,
        rarity: Rarity,
    ) -> Result<Vec<Egg>> {
        let draws = self.roll_fixed(count, rarity, affinity)?;
        let now = self.now();
        let eggs = lay_eggs(owner, ADMIN_ORIGIN, affinity, &draws, now, Some(now));
        if eggs.is_empty() {
            return Ok(eggs);
        }
        let mut batch = WriteBatch::new();
        push_eggs(&mut batch, &eggs)?;
        self.gateway().commit(batch).await?;
        tracing::info!(owner, count, %rarity, "admin eggs laid");
        Ok(eggs)
    }

    /// Hatch every unhatched egg regardless of its deadline.
    pub async fn force_hatch_all(&self, owner: &str) -> Result<Vec<OwnedCollectible>> {
        let attempts = self.config().max_commit_attempts.max(1);
        for attempt in 1..=attempts {
            let eggs = self.list_unhatched_eggs(owner).await?;
            if eggs.is_empty() {
                return Ok(Vec::new());
            }
            let now = self.now();
            let mut batch = WriteBatch::new();
            let hatched = eggs
                .iter()
                .map(|egg| push_hatch(&mut batch, egg, now))
                .collect::<Result<Vec<_>, StoreError>>()?;
            match self.gateway().commit(batch).await {
                Ok(()) => {
                    tracing::info!(owner, count = hatched.len(), "admin hatched all eggs");
                    return Ok(hatched);
                }
                Err(StoreError::PreconditionFailed { id, .. }) => {
                    tracing::warn!(owner, attempt, egg = %id, "egg hatched concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ProgressionError::Contention { attempts }.into())
    }

    /// Zero the owner's cumulative counters. Sessions, eggs and collectibles stay.
    pub async fn reset_stats(&self, owner: &str) -> Result<OwnerStats> {
        let stats = OwnerStats::empty(owner);
        let mut batch = WriteBatch::new();
        batch.put(OWNERS, Document::from_value(owner, &stats)?);
        self.gateway().commit(batch).await?;
        tracing::info!(owner, "stats reset");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::catalog::Catalog;
    use crate::clock::ManualClock;
    use crate::gateway::MemoryStore;
    use crate::progression::Stage;
    use crate::storage::ProgressionConfig;

    fn store() -> ProgressionStore {
        ProgressionStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Catalog::builtin()),
            Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            )),
            ProgressionConfig::default(),
        )
    }

    #[tokio::test]
    async fn forced_eggs_are_ready_and_tagged_admin() {
        let store = store();
        let eggs = store
            .force_generate_eggs("ana", 3, AffinityTag::Fruit, Rarity::Legendary)
            .await
            .unwrap();
        assert_eq!(eggs.len(), 3);
        let now = store.now();
        for egg in &eggs {
            assert_eq!(egg.rarity, Rarity::Legendary);
            assert_eq!(egg.origin_session_id, ADMIN_ORIGIN);
            assert!(egg.is_ready(now));
        }
        let hatched = store.hatch_egg("ana", &eggs[0].id).await.unwrap();
        assert_eq!(hatched.stage, Stage::Hatchling);
    }

    #[tokio::test]
    async fn hatch_all_ignores_deadlines() {
        let store = store();
        store
            .generate_eggs("ana", "s1", 90, AffinityTag::Seed)
            .await
            .unwrap();
        let hatched = store.force_hatch_all("ana").await.unwrap();
        assert_eq!(hatched.len(), 3);
        assert!(store.list_unhatched_eggs("ana").await.unwrap().is_empty());
        assert_eq!(store.list_collectibles("ana", None).await.unwrap().len(), 3);
        assert!(store.force_hatch_all("ana").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_zeroes_counters_only() {
        let store = store();
        store
            .record_session("ana", 45, AffinityTag::Seed)
            .await
            .unwrap();
        assert_eq!(store.owner_stats("ana").await.unwrap().total_sessions, 1);

        let stats = store.reset_stats("ana").await.unwrap();
        assert_eq!(stats, OwnerStats::empty("ana"));
        assert_eq!(store.owner_stats("ana").await.unwrap(), stats);
    }
}
