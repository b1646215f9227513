//! Progression store: sessions, eggs and owned collectibles.
//!
//! A completed timer run becomes a [`Session`], earns zero to three [`Egg`]s
//! with independent hatch deadlines, and grows every [`OwnedCollectible`]
//! the owner already has. Hatching turns a matured egg into a new
//! collectible at [`Stage::Hatchling`].

mod admin;
mod model;
mod store;

pub use model::{
    Egg, GrowthChange, OwnedCollectible, OwnerStats, Session, SessionOutcome, Stage, ADMIN_ORIGIN,
    ADULT_AT, COLLECTIBLES, EGGS, JUVENILE_AT, OWNERS, SESSIONS,
};
pub use store::{accelerated_hatch_at, ProgressionStore};
