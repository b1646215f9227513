//! Session → egg → collectible lifecycle over a [`DocumentStore`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use futures::stream::{BoxStream, StreamExt};
use uuid::Uuid;

use super::model::{
    Egg, GrowthChange, OwnedCollectible, OwnerStats, Session, SessionOutcome, Stage, COLLECTIBLES,
    EGGS, OWNERS, SESSIONS,
};
use crate::catalog::{AffinityTag, Catalog, Rarity};
use crate::clock::Clock;
use crate::error::{CoreError, ProgressionError, Result, StoreError};
use crate::gateway::{
    watch_query, Direction, Document, DocumentStore, FieldChange, Precondition, Query, WriteBatch,
};
use crate::reward::{reward_count, RewardDraw, RewardRoller};
use crate::storage::ProgressionConfig;
use crate::timer::CompletedSession;

pub struct ProgressionStore {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    roller: Mutex<RewardRoller>,
    config: ProgressionConfig,
}

impl ProgressionStore {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        catalog: Arc<Catalog>,
        clock: Arc<dyn Clock>,
        config: ProgressionConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            roller: Mutex::new(RewardRoller::new(config.rng_seed)),
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(super) fn gateway(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    fn attempts(&self) -> u32 {
        self.config.max_commit_attempts.max(1)
    }

    // ── Sessions ────────────────────────────────────────────────────

    /// Persist a completed session and bump the owner's totals in one batch.
    pub async fn record_session(
        &self,
        owner: &str,
        duration_minutes: u32,
        affinity: AffinityTag,
    ) -> Result<String> {
        positive_duration(duration_minutes)?;
        let now = self.now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            duration_minutes,
            affinity,
            started_at: now - Duration::minutes(i64::from(duration_minutes)),
            completed_at: Some(now),
            completed: true,
            reward_count: reward_count(duration_minutes),
        };
        let mut batch = WriteBatch::new();
        push_session(&mut batch, &session)?;
        self.store.commit(batch).await?;
        tracing::info!(owner, session = %session.id, duration_minutes, "session recorded");
        Ok(session.id)
    }

    /// Roll and persist the eggs a session earned, all or none.
    pub async fn generate_eggs(
        &self,
        owner: &str,
        session_id: &str,
        duration_minutes: u32,
        affinity: AffinityTag,
    ) -> Result<Vec<Egg>> {
        let draws = self.roll(duration_minutes, affinity)?;
        let eggs = lay_eggs(owner, session_id, affinity, &draws, self.now(), None);
        if eggs.is_empty() {
            return Ok(eggs);
        }
        let mut batch = WriteBatch::new();
        push_eggs(&mut batch, &eggs)?;
        self.store.commit(batch).await?;
        tracing::info!(owner, session = session_id, count = eggs.len(), "eggs laid");
        Ok(eggs)
    }

    /// Record a finished timer run, lay its eggs and grow every owned
    /// collectible as a single atomic unit.
    ///
    /// The run id keys the session document, so replaying the same run fails
    /// with [`ProgressionError::DuplicateSession`] and writes nothing.
    pub async fn complete_session(
        &self,
        owner: &str,
        completed: &CompletedSession,
    ) -> Result<SessionOutcome> {
        positive_duration(completed.duration_minutes)?;
        let session = Session {
            id: completed.id.clone(),
            owner: owner.to_string(),
            duration_minutes: completed.duration_minutes,
            affinity: completed.affinity,
            started_at: completed.started_at,
            completed_at: Some(completed.completed_at),
            completed: true,
            reward_count: reward_count(completed.duration_minutes),
        };
        if self.store.get(SESSIONS, &session.id).await?.is_some() {
            return Err(duplicate_session(&session.id));
        }
        let draws = self.roll(session.duration_minutes, session.affinity)?;
        let eggs = lay_eggs(owner, &session.id, session.affinity, &draws, self.now(), None);

        for attempt in 1..=self.attempts() {
            let owned = self.owned(owner, None).await?;
            let mut batch = WriteBatch::new();
            push_session(&mut batch, &session)?;
            push_eggs(&mut batch, &eggs)?;
            let growth = push_growth(&mut batch, &owned);

            match self.store.commit(batch).await {
                Ok(()) => {
                    tracing::info!(
                        owner,
                        session = %session.id,
                        minutes = session.duration_minutes,
                        eggs = eggs.len(),
                        "session completed"
                    );
                    log_stage_changes(owner, &growth);
                    return Ok(SessionOutcome {
                        session,
                        eggs,
                        growth,
                    });
                }
                Err(StoreError::AlreadyExists { collection, .. }) if collection == SESSIONS => {
                    return Err(duplicate_session(&session.id));
                }
                Err(StoreError::PreconditionFailed { id, .. }) => {
                    tracing::warn!(owner, attempt, collectible = %id, "growth conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ProgressionError::Contention {
            attempts: self.attempts(),
        }
        .into())
    }

    // ── Eggs ────────────────────────────────────────────────────────

    /// Unhatched eggs, oldest first.
    pub async fn list_unhatched_eggs(&self, owner: &str) -> Result<Vec<Egg>> {
        let docs = self.store.query(&unhatched_query(owner)).await?;
        Ok(decode_all(&docs)?)
    }

    /// Live view of [`Self::list_unhatched_eggs`], re-emitted after every commit.
    pub fn watch_unhatched_eggs(&self, owner: &str) -> BoxStream<'static, Result<Vec<Egg>>> {
        watch_decoded(Arc::clone(&self.store), unhatched_query(owner))
    }

    pub async fn egg(&self, owner: &str, egg_id: &str) -> Result<Egg> {
        let doc = self
            .store
            .get(EGGS, egg_id)
            .await?
            .ok_or_else(|| ProgressionError::EggNotFound(egg_id.to_string()))?;
        let egg: Egg = doc.decode()?;
        if egg.owner != owner {
            return Err(ProgressionError::WrongOwner {
                kind: "egg",
                id: egg.id,
                owner: owner.to_string(),
            }
            .into());
        }
        Ok(egg)
    }

    /// Mark a matured egg hatched and create its collectible atomically.
    ///
    /// A second call for the same egg fails with the benign
    /// [`ProgressionError::AlreadyHatched`].
    pub async fn hatch_egg(&self, owner: &str, egg_id: &str) -> Result<OwnedCollectible> {
        let egg = self.egg(owner, egg_id).await?;
        if egg.hatched {
            return Err(already_hatched(&egg.id));
        }
        let now = self.now();
        if self.config.enforce_hatch_readiness && !egg.is_ready(now) {
            return Err(ProgressionError::NotReady {
                egg_id: egg.id,
                hatch_at: egg.hatch_at,
            }
            .into());
        }

        let mut batch = WriteBatch::new();
        let collectible = push_hatch(&mut batch, &egg, now)?;
        match self.store.commit(batch).await {
            Ok(()) => {}
            Err(StoreError::PreconditionFailed { .. }) => return Err(already_hatched(&egg.id)),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(
            owner,
            egg = %egg.id,
            collectible = %collectible.id,
            species = %collectible.catalog_ref,
            "egg hatched"
        );
        Ok(collectible)
    }

    /// Pull an egg's hatch deadline earlier.
    ///
    /// Enough boosts to cover the rarity's acceleration cost make the egg
    /// ready immediately; fewer move the deadline by one credit each. The
    /// deadline never moves below now and the egg is never hatched here.
    pub async fn accelerate_egg(&self, owner: &str, egg_id: &str, boost_units: u32) -> Result<Egg> {
        for attempt in 1..=self.attempts() {
            let mut egg = self.egg(owner, egg_id).await?;
            if egg.hatched {
                return Err(already_hatched(&egg.id));
            }
            let now = self.now();
            let target = accelerated_hatch_at(&egg, boost_units, now, self.config.boost_credit());
            if target == egg.hatch_at {
                return Ok(egg);
            }

            let mut batch = WriteBatch::new();
            batch.update(
                EGGS,
                &egg.id,
                vec![FieldChange::set("hatch_at", target.timestamp_millis())],
                vec![
                    Precondition::new("hatched", false),
                    Precondition::new("hatch_at", egg.hatch_at.timestamp_millis()),
                ],
            );
            match self.store.commit(batch).await {
                Ok(()) => {
                    tracing::info!(owner, egg = %egg.id, boost_units, hatch_at = %target, "egg accelerated");
                    egg.hatch_at = target;
                    return Ok(egg);
                }
                Err(StoreError::PreconditionFailed { .. }) => {
                    tracing::warn!(owner, attempt, egg = %egg.id, "egg changed during acceleration, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ProgressionError::Contention {
            attempts: self.attempts(),
        }
        .into())
    }

    // ── Collectibles ────────────────────────────────────────────────

    /// Advance every collectible the owner has by one session.
    ///
    /// Not idempotent: each call counts as another session. Use
    /// [`Self::complete_session`] to tie growth to a recorded session.
    pub async fn grow_owned_after_session(&self, owner: &str) -> Result<Vec<GrowthChange>> {
        for attempt in 1..=self.attempts() {
            let owned = self.owned(owner, None).await?;
            let mut batch = WriteBatch::new();
            let growth = push_growth(&mut batch, &owned);
            match self.store.commit(batch).await {
                Ok(()) => {
                    log_stage_changes(owner, &growth);
                    return Ok(growth);
                }
                Err(StoreError::PreconditionFailed { id, .. }) => {
                    tracing::warn!(owner, attempt, collectible = %id, "growth conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ProgressionError::Contention {
            attempts: self.attempts(),
        }
        .into())
    }

    /// Owned collectibles, most recently collected first.
    pub async fn list_collectibles(
        &self,
        owner: &str,
        rarity: Option<Rarity>,
    ) -> Result<Vec<OwnedCollectible>> {
        self.owned(owner, rarity).await
    }

    pub fn watch_collectibles(
        &self,
        owner: &str,
        rarity: Option<Rarity>,
    ) -> BoxStream<'static, Result<Vec<OwnedCollectible>>> {
        watch_decoded(Arc::clone(&self.store), collectibles_query(owner, rarity))
    }

    /// Set or clear (with an empty string) a collectible's nickname.
    pub async fn rename_collectible(
        &self,
        owner: &str,
        collectible_id: &str,
        nickname: &str,
    ) -> Result<OwnedCollectible> {
        let doc = self
            .store
            .get(COLLECTIBLES, collectible_id)
            .await?
            .ok_or_else(|| ProgressionError::CollectibleNotFound(collectible_id.to_string()))?;
        let mut collectible: OwnedCollectible = doc.decode()?;
        if collectible.owner != owner {
            return Err(ProgressionError::WrongOwner {
                kind: "collectible",
                id: collectible.id,
                owner: owner.to_string(),
            }
            .into());
        }

        let nickname = nickname.trim();
        collectible.nickname = (!nickname.is_empty()).then(|| nickname.to_string());
        let mut batch = WriteBatch::new();
        batch.update(
            COLLECTIBLES,
            &collectible.id,
            vec![FieldChange::set(
                "nickname",
                serde_json::to_value(&collectible.nickname)?,
            )],
            Vec::new(),
        );
        self.store.commit(batch).await?;
        Ok(collectible)
    }

    pub async fn owner_stats(&self, owner: &str) -> Result<OwnerStats> {
        match self.store.get(OWNERS, owner).await? {
            Some(doc) => Ok(doc.decode()?),
            None => Ok(OwnerStats::empty(owner)),
        }
    }

    pub(super) async fn owned(
        &self,
        owner: &str,
        rarity: Option<Rarity>,
    ) -> Result<Vec<OwnedCollectible>> {
        let docs = self.store.query(&collectibles_query(owner, rarity)).await?;
        Ok(decode_all(&docs)?)
    }

    pub(super) fn roll(&self, minutes: u32, affinity: AffinityTag) -> Result<Vec<RewardDraw>> {
        let mut roller = self.roller.lock().unwrap_or_else(|e| e.into_inner());
        Ok(roller.draw(minutes, affinity, &self.catalog)?)
    }

    pub(super) fn roll_fixed(
        &self,
        count: u32,
        rarity: Rarity,
        affinity: AffinityTag,
    ) -> Result<Vec<RewardDraw>> {
        let mut roller = self.roller.lock().unwrap_or_else(|e| e.into_inner());
        Ok(roller.draw_fixed(count, rarity, affinity, &self.catalog)?)
    }
}

/// New hatch deadline after spending `boost_units`.
pub fn accelerated_hatch_at(
    egg: &Egg,
    boost_units: u32,
    now: DateTime<Utc>,
    credit: Duration,
) -> DateTime<Utc> {
    if boost_units == 0 || egg.hatch_at <= now {
        return egg.hatch_at;
    }
    if boost_units >= egg.rarity.acceleration_cost() {
        return now;
    }
    (egg.hatch_at - credit * boost_units as i32).max(now)
}

pub(super) fn lay_eggs(
    owner: &str,
    session_id: &str,
    affinity: AffinityTag,
    draws: &[RewardDraw],
    now: DateTime<Utc>,
    hatch_at: Option<DateTime<Utc>>,
) -> Vec<Egg> {
    draws
        .iter()
        .map(|draw| Egg {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            catalog_ref: draw.entry_id.clone(),
            rarity: draw.rarity,
            affinity,
            created_at: now,
            hatch_at: hatch_at.unwrap_or_else(|| now + draw.rarity.hatch_duration()),
            hatched: false,
            origin_session_id: session_id.to_string(),
        })
        .collect()
}

fn push_session(batch: &mut WriteBatch, session: &Session) -> Result<(), StoreError> {
    batch.create(SESSIONS, Document::from_value(&session.id, session)?);
    batch.merge(
        OWNERS,
        &session.owner,
        vec![
            FieldChange::set("owner", session.owner.as_str()),
            FieldChange::increment("total_focus_minutes", i64::from(session.duration_minutes)),
            FieldChange::increment("total_sessions", 1),
        ],
    );
    Ok(())
}

pub(super) fn push_eggs(batch: &mut WriteBatch, eggs: &[Egg]) -> Result<(), StoreError> {
    for egg in eggs {
        batch.create(EGGS, Document::from_value(&egg.id, egg)?);
    }
    Ok(())
}

/// Queue the hatch of `egg`, guarded against a concurrent hatch.
pub(super) fn push_hatch(
    batch: &mut WriteBatch,
    egg: &Egg,
    now: DateTime<Utc>,
) -> Result<OwnedCollectible, StoreError> {
    let collectible = OwnedCollectible {
        id: Uuid::new_v4().to_string(),
        owner: egg.owner.clone(),
        catalog_ref: egg.catalog_ref.clone(),
        rarity: egg.rarity,
        stage: Stage::Hatchling,
        sessions_with_collectible: 0,
        collected_at: now,
        nickname: None,
        origin_egg_id: egg.id.clone(),
    };
    batch.update(
        EGGS,
        &egg.id,
        vec![FieldChange::set("hatched", true)],
        vec![Precondition::new("hatched", false)],
    );
    batch.create(COLLECTIBLES, Document::from_value(&collectible.id, &collectible)?);
    batch.merge(
        OWNERS,
        &egg.owner,
        vec![
            FieldChange::set("owner", egg.owner.as_str()),
            FieldChange::increment("eggs_hatched", 1),
        ],
    );
    Ok(collectible)
}

/// Queue one growth step per collectible, each guarded by its current counter.
fn push_growth(batch: &mut WriteBatch, owned: &[OwnedCollectible]) -> Vec<GrowthChange> {
    owned
        .iter()
        .map(|collectible| {
            let change = GrowthChange::for_collectible(collectible);
            batch.update(
                COLLECTIBLES,
                &collectible.id,
                vec![
                    FieldChange::increment("sessions_with_collectible", 1),
                    FieldChange::set("stage", change.to.as_str()),
                ],
                vec![Precondition::new(
                    "sessions_with_collectible",
                    collectible.sessions_with_collectible,
                )],
            );
            change
        })
        .collect()
}

fn log_stage_changes(owner: &str, growth: &[GrowthChange]) {
    for change in growth.iter().filter(|c| c.is_stage_change()) {
        tracing::info!(
            owner,
            collectible = %change.collectible_id,
            from = %change.from,
            to = %change.to,
            "collectible grew"
        );
    }
}

fn unhatched_query(owner: &str) -> Query {
    Query::new(EGGS)
        .where_eq("owner", owner)
        .where_eq("hatched", false)
        .order_by("created_at", Direction::Asc)
}

fn collectibles_query(owner: &str, rarity: Option<Rarity>) -> Query {
    let query = Query::new(COLLECTIBLES).where_eq("owner", owner);
    let query = match rarity {
        Some(rarity) => query.where_eq("rarity", rarity.as_str()),
        None => query,
    };
    query.order_by("collected_at", Direction::Desc)
}

fn decode_all<T: serde::de::DeserializeOwned>(docs: &[Document]) -> Result<Vec<T>, StoreError> {
    docs.iter().map(Document::decode).collect()
}

fn watch_decoded<T>(store: Arc<dyn DocumentStore>, query: Query) -> BoxStream<'static, Result<Vec<T>>>
where
    T: serde::de::DeserializeOwned + Send + 'static,
{
    watch_query(store, query)
        .map(|docs| -> Result<Vec<T>> { Ok(decode_all(&docs?)?) })
        .boxed()
}

fn already_hatched(egg_id: &str) -> CoreError {
    tracing::warn!(egg = egg_id, "egg already hatched");
    ProgressionError::AlreadyHatched {
        egg_id: egg_id.to_string(),
    }
    .into()
}

fn positive_duration(minutes: u32) -> Result<()> {
    if minutes == 0 {
        return Err(ProgressionError::InvalidDuration { minutes }.into());
    }
    Ok(())
}

fn duplicate_session(session_id: &str) -> CoreError {
    tracing::warn!(session = session_id, "session already recorded");
    ProgressionError::DuplicateSession {
        session_id: session_id.to_string(),
    }
    .into()
}
