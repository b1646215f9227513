//! Integration tests for the session → egg → collectible lifecycle.
//!
//! Flows run against the in-memory gateway and, where the backend matters,
//! against the SQLite gateway as well.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::StreamExt;

use focusnest_core::gateway::{Document, DocumentStore, MemoryStore, WriteBatch};
use focusnest_core::progression::{Egg, ProgressionStore, Stage, EGGS};
use focusnest_core::storage::{ProgressionConfig, SqliteStore};
use focusnest_core::{
    AffinityTag, Catalog, CompletedSession, CoreError, FocusTimer, ManualClock, ProgressionError,
    Rarity,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

fn harness(
    backend: Arc<dyn DocumentStore>,
    config: ProgressionConfig,
) -> (ProgressionStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = ProgressionStore::new(backend, Arc::new(Catalog::builtin()), clock.clone(), config);
    (store, clock)
}

fn seeded() -> ProgressionConfig {
    ProgressionConfig {
        rng_seed: Some(42),
        ..ProgressionConfig::default()
    }
}

fn run(id: &str, minutes: u32, affinity: AffinityTag) -> CompletedSession {
    CompletedSession {
        id: id.to_string(),
        duration_minutes: minutes,
        affinity,
        started_at: t0() - Duration::minutes(i64::from(minutes)),
        completed_at: t0(),
    }
}

/// Store a rare egg due six hours from `t0` directly through the gateway.
async fn plant_rare_egg(backend: &Arc<dyn DocumentStore>) -> Egg {
    let egg = Egg {
        id: "rare-egg".into(),
        owner: "ana".into(),
        catalog_ref: "arara-azul".into(),
        rarity: Rarity::Rare,
        affinity: AffinityTag::Fruit,
        created_at: t0(),
        hatch_at: t0() + Rarity::Rare.hatch_duration(),
        hatched: false,
        origin_session_id: "s1".into(),
    };
    let mut batch = WriteBatch::new();
    batch.create(EGGS, Document::from_value(&egg.id, &egg).unwrap());
    backend.commit(batch).await.unwrap();
    egg
}

async fn forty_five_minute_fruit_session(backend: Arc<dyn DocumentStore>) {
    let (store, clock) = harness(backend, seeded());
    let catalog = Catalog::builtin();

    let mut timer = FocusTimer::default();
    timer.start(45, AffinityTag::Fruit);
    timer.skip_to_end();
    let completed = timer.completed_session().unwrap();

    let outcome = store.complete_session("ana", &completed).await.unwrap();
    assert_eq!(outcome.session.reward_count, 2);
    assert_eq!(outcome.session.id, completed.id);
    assert_eq!(outcome.eggs.len(), 2);
    for egg in &outcome.eggs {
        assert_eq!(egg.hatch_at, egg.created_at + egg.rarity.hatch_duration());
        assert_eq!(egg.origin_session_id, completed.id);
        assert!(!egg.hatched);
        let entry = catalog.get(&egg.catalog_ref).unwrap();
        assert_eq!(entry.rarity, egg.rarity);
        assert_eq!(entry.affinity, AffinityTag::Fruit);
    }
    assert!(outcome.growth.is_empty());

    let pending = store.list_unhatched_eggs("ana").await.unwrap();
    assert_eq!(pending.len(), 2);

    clock.advance(Duration::hours(12));
    for egg in &outcome.eggs {
        store.hatch_egg("ana", &egg.id).await.unwrap();
    }

    let owned = store.list_collectibles("ana", None).await.unwrap();
    assert_eq!(owned.len(), 2);
    for collectible in &owned {
        assert_eq!(collectible.stage, Stage::Hatchling);
        assert_eq!(collectible.sessions_with_collectible, 0);
    }
    assert!(store.list_unhatched_eggs("ana").await.unwrap().is_empty());

    let stats = store.owner_stats("ana").await.unwrap();
    assert_eq!(stats.total_focus_minutes, 45);
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.eggs_hatched, 2);
}

#[tokio::test]
async fn test_forty_five_minute_fruit_session_memory() {
    forty_five_minute_fruit_session(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_forty_five_minute_fruit_session_sqlite() {
    forty_five_minute_fruit_session(Arc::new(SqliteStore::open_memory().unwrap())).await;
}

#[tokio::test]
async fn test_hatching_twice_creates_one_collectible() {
    let (store, _) = harness(Arc::new(MemoryStore::new()), seeded());
    let eggs = store
        .force_generate_eggs("ana", 1, AffinityTag::Seed, Rarity::Common)
        .await
        .unwrap();

    store.hatch_egg("ana", &eggs[0].id).await.unwrap();
    let err = store.hatch_egg("ana", &eggs[0].id).await.unwrap_err();
    assert!(err.is_benign());
    assert!(matches!(
        err,
        CoreError::Progression(ProgressionError::AlreadyHatched { .. })
    ));
    assert_eq!(store.list_collectibles("ana", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stage_thresholds_through_growth() {
    let (store, _) = harness(Arc::new(MemoryStore::new()), seeded());
    store
        .force_generate_eggs("ana", 1, AffinityTag::Seed, Rarity::Common)
        .await
        .unwrap();
    store.force_hatch_all("ana").await.unwrap();

    let mut previous = Stage::Hatchling;
    for session in 1..=16u32 {
        let growth = store.grow_owned_after_session("ana").await.unwrap();
        assert_eq!(growth.len(), 1);
        let change = &growth[0];
        assert_eq!(change.sessions_with_collectible, session);
        assert!(change.to >= previous);
        assert_eq!(change.is_stage_change(), session == 5 || session == 15);

        let expected = match session {
            0..=4 => Stage::Hatchling,
            5..=14 => Stage::Juvenile,
            _ => Stage::Adult,
        };
        let stored = store.list_collectibles("ana", None).await.unwrap();
        assert_eq!(stored[0].stage, expected);
        assert_eq!(stored[0].sessions_with_collectible, session);
        previous = change.to;
    }
}

#[tokio::test]
async fn test_rare_egg_acceleration_respects_readiness() {
    let backend: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let (store, clock) = harness(backend.clone(), seeded());
    let egg = plant_rare_egg(&backend).await;

    let boosted = store.accelerate_egg("ana", &egg.id, 1).await.unwrap();
    assert_eq!(boosted.hatch_at, egg.hatch_at - Duration::minutes(60));
    assert!(!boosted.hatched);
    assert_eq!(store.list_unhatched_eggs("ana").await.unwrap()[0].hatch_at, boosted.hatch_at);

    let err = store.hatch_egg("ana", &egg.id).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Progression(ProgressionError::NotReady { hatch_at, .. }) if hatch_at == boosted.hatch_at
    ));
    assert!(!err.is_benign());

    clock.advance(Duration::hours(5));
    let collectible = store.hatch_egg("ana", &egg.id).await.unwrap();
    assert_eq!(collectible.catalog_ref, "arara-azul");
    assert_eq!(collectible.rarity, Rarity::Rare);
}

#[tokio::test]
async fn test_full_boost_matures_egg_immediately() {
    let backend: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let (store, _) = harness(backend.clone(), seeded());
    let egg = plant_rare_egg(&backend).await;

    let boosted = store
        .accelerate_egg("ana", &egg.id, Rarity::Rare.acceleration_cost())
        .await
        .unwrap();
    assert_eq!(boosted.hatch_at, t0());
    assert!(!boosted.hatched);
    store.hatch_egg("ana", &egg.id).await.unwrap();

    let err = store.accelerate_egg("ana", &egg.id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Progression(ProgressionError::AlreadyHatched { .. })
    ));
}

#[tokio::test]
async fn test_early_hatch_allowed_when_readiness_not_enforced() {
    let backend: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let config = ProgressionConfig {
        enforce_hatch_readiness: false,
        ..seeded()
    };
    let (store, _) = harness(backend.clone(), config);
    let egg = plant_rare_egg(&backend).await;

    store.accelerate_egg("ana", &egg.id, 1).await.unwrap();
    let collectible = store.hatch_egg("ana", &egg.id).await.unwrap();
    assert_eq!(collectible.stage, Stage::Hatchling);
}

async fn replayed_session_applies_once(backend: Arc<dyn DocumentStore>) {
    let (store, _) = harness(backend, seeded());
    store
        .force_generate_eggs("ana", 2, AffinityTag::Biscuit, Rarity::Uncommon)
        .await
        .unwrap();
    store.force_hatch_all("ana").await.unwrap();

    let completed = run("run-1", 90, AffinityTag::Biscuit);
    let first = store.complete_session("ana", &completed).await.unwrap();
    assert_eq!(first.eggs.len(), 3);
    assert_eq!(first.growth.len(), 2);

    let err = store.complete_session("ana", &completed).await.unwrap_err();
    assert!(err.is_benign());
    assert!(matches!(
        err,
        CoreError::Progression(ProgressionError::DuplicateSession { ref session_id }) if session_id == "run-1"
    ));

    for collectible in store.list_collectibles("ana", None).await.unwrap() {
        assert_eq!(collectible.sessions_with_collectible, 1);
    }
    assert_eq!(store.list_unhatched_eggs("ana").await.unwrap().len(), 3);
    let stats = store.owner_stats("ana").await.unwrap();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.total_focus_minutes, 90);
}

#[tokio::test]
async fn test_replayed_session_applies_once_memory() {
    replayed_session_applies_once(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_replayed_session_applies_once_sqlite() {
    replayed_session_applies_once(Arc::new(SqliteStore::open_memory().unwrap())).await;
}

#[tokio::test]
async fn test_record_then_grow_is_caller_driven() {
    let (store, _) = harness(Arc::new(MemoryStore::new()), seeded());
    store
        .force_generate_eggs("ana", 1, AffinityTag::Seed, Rarity::Common)
        .await
        .unwrap();
    store.force_hatch_all("ana").await.unwrap();

    let session_id = store.record_session("ana", 30, AffinityTag::Seed).await.unwrap();
    let eggs = store
        .generate_eggs("ana", &session_id, 30, AffinityTag::Seed)
        .await
        .unwrap();
    assert_eq!(eggs.len(), 1);
    store.grow_owned_after_session("ana").await.unwrap();
    store.grow_owned_after_session("ana").await.unwrap();

    let owned = store.list_collectibles("ana", None).await.unwrap();
    assert_eq!(owned[0].sessions_with_collectible, 2);
    assert_eq!(store.owner_stats("ana").await.unwrap().total_sessions, 1);
}

#[tokio::test]
async fn test_unhatched_eggs_are_oldest_first() {
    let (store, clock) = harness(Arc::new(MemoryStore::new()), seeded());
    let first = store
        .generate_eggs("ana", "s1", 20, AffinityTag::Seed)
        .await
        .unwrap();
    clock.advance(Duration::minutes(10));
    let second = store
        .generate_eggs("ana", "s2", 20, AffinityTag::Fruit)
        .await
        .unwrap();

    let pending = store.list_unhatched_eggs("ana").await.unwrap();
    let ids: Vec<_> = pending.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![first[0].id.as_str(), second[0].id.as_str()]);
}

#[tokio::test]
async fn test_collectibles_filter_and_order() {
    let (store, clock) = harness(Arc::new(MemoryStore::new()), seeded());
    store
        .force_generate_eggs("ana", 1, AffinityTag::Seed, Rarity::Common)
        .await
        .unwrap();
    store.force_hatch_all("ana").await.unwrap();
    clock.advance(Duration::minutes(1));
    store
        .force_generate_eggs("ana", 1, AffinityTag::Seed, Rarity::Legendary)
        .await
        .unwrap();
    store.force_hatch_all("ana").await.unwrap();

    let all = store.list_collectibles("ana", None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].rarity, Rarity::Legendary);
    assert!(all[0].collected_at > all[1].collected_at);

    let common = store
        .list_collectibles("ana", Some(Rarity::Common))
        .await
        .unwrap();
    assert_eq!(common.len(), 1);
    assert_eq!(common[0].rarity, Rarity::Common);
    assert!(store.list_collectibles("bia", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_live_egg_view_follows_commits() {
    let (store, _) = harness(Arc::new(MemoryStore::new()), seeded());
    let mut live = store.watch_unhatched_eggs("ana");
    assert!(live.next().await.unwrap().unwrap().is_empty());

    let eggs = store
        .force_generate_eggs("ana", 2, AffinityTag::Fruit, Rarity::Common)
        .await
        .unwrap();
    assert_eq!(live.next().await.unwrap().unwrap().len(), 2);

    store.hatch_egg("ana", &eggs[0].id).await.unwrap();
    let remaining = live.next().await.unwrap().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, eggs[1].id);

    let mut aviary = store.watch_collectibles("ana", None);
    assert_eq!(aviary.next().await.unwrap().unwrap().len(), 1);
}
