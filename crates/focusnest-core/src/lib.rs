//! # Focusnest Core Library
//!
//! This library provides the core business logic for Focusnest, a focus timer
//! that rewards completed sessions with eggs which hatch into collectible
//! birds and grow as the owner keeps focusing. It follows a CLI-first
//! philosophy: every operation is available through the standalone
//! `focusnest` binary built on top of this crate.
//!
//! ## Architecture
//!
//! - **Timer**: A session-scoped countdown state machine advanced by ticks
//! - **Reward Roller**: Reward count, weighted rarity rolls and catalog picks
//! - **Progression Store**: Sessions, eggs and owned collectibles over an
//!   abstract document store with atomic batches
//! - **Storage**: SQLite document backend and TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusTimer`]: Timer state machine
//! - [`ProgressionStore`]: Session → egg → collectible lifecycle
//! - [`DocumentStore`]: Persistence gateway trait
//! - [`Config`]: Application configuration management

pub mod catalog;
pub mod clock;
pub mod error;
pub mod events;
pub mod gateway;
pub mod progression;
pub mod reward;
pub mod storage;
pub mod timer;

pub use catalog::{AffinityTag, Catalog, CatalogEntry, Rarity};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CatalogError, ConfigError, CoreError, ProgressionError, StoreError};
pub use events::Event;
pub use gateway::{DocumentStore, MemoryStore};
pub use progression::{Egg, OwnedCollectible, OwnerStats, ProgressionStore, SessionOutcome, Stage};
pub use reward::{reward_count, RewardRoller};
pub use storage::{Config, SqliteStore};
pub use timer::{CompletedSession, FocusTimer, TimerState};
