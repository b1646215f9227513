//! Core error types for focusnest-core.
//!
//! This module defines the error hierarchy using thiserror. Errors are
//! grouped by who has to react to them: configuration errors are fatal at
//! load time, store errors may be retried, and progression errors describe
//! domain outcomes (some of which are benign races).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::Rarity;

/// Core error type for focusnest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence gateway errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Catalog configuration errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Progression rule violations and benign races
    #[error("{0}")]
    Progression(#[from] ProgressionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether the caller may safely discard this error and carry on.
    pub fn is_benign(&self) -> bool {
        matches!(self, CoreError::Progression(e) if e.is_benign())
    }

    /// Whether re-attempting the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::Store(e) => e.is_transient(),
            CoreError::Progression(ProgressionError::Contention { .. }) => true,
            _ => false,
        }
    }
}

/// Persistence gateway errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Document does not exist
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// Create targeted an existing document
    #[error("Document {collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },

    /// A batch precondition did not hold; nothing was written
    #[error("Precondition failed on {collection}/{id}: field '{field}' changed")]
    PreconditionFailed {
        collection: String,
        id: String,
        field: String,
    },

    /// Increment targeted a non-numeric field
    #[error("Field '{field}' of {collection}/{id} is not numeric")]
    NotNumeric {
        collection: String,
        id: String,
        field: String,
    },

    /// Backend temporarily unavailable (busy, locked)
    #[error("Store temporarily unavailable: {0}")]
    Unavailable(String),

    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Any other backend failure
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Document body could not be (de)serialized
    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Transient errors are safe to retry because batches apply all-or-nothing.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::PreconditionFailed { .. }
        )
    }
}

/// Catalog configuration errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No entry of the requested rarity exists
    #[error("Catalog has no entries of rarity '{0}'")]
    MissingRarity(Rarity),

    /// Two entries share an id
    #[error("Duplicate catalog entry id: {0}")]
    DuplicateEntry(String),

    /// Lookup of an id not in the catalog
    #[error("Unknown catalog entry: {0}")]
    UnknownEntry(String),

    /// Catalog file could not be read or parsed
    #[error("Failed to parse catalog: {0}")]
    Parse(String),
}

/// Progression outcomes that are not plain store failures.
#[derive(Error, Debug)]
pub enum ProgressionError {
    /// Egg was hatched by an earlier (possibly concurrent) call
    #[error("Egg {egg_id} is already hatched")]
    AlreadyHatched { egg_id: String },

    /// Egg is still incubating
    #[error("Egg {egg_id} is not ready to hatch until {hatch_at}")]
    NotReady {
        egg_id: String,
        hatch_at: DateTime<Utc>,
    },

    /// Session was already recorded; its rewards and growth are applied
    #[error("Session {session_id} was already recorded")]
    DuplicateSession { session_id: String },

    #[error("Egg {0} not found")]
    EggNotFound(String),

    #[error("Collectible {0} not found")]
    CollectibleNotFound(String),

    /// Entity belongs to another owner
    #[error("{kind} {id} is not owned by {owner}")]
    WrongOwner {
        kind: &'static str,
        id: String,
        owner: String,
    },

    /// Sessions must last at least one minute
    #[error("Session duration must be positive, got {minutes} minutes")]
    InvalidDuration { minutes: u32 },

    /// Optimistic concurrency retries exhausted
    #[error("Gave up after {attempts} conflicting attempts")]
    Contention { attempts: u32 },
}

impl ProgressionError {
    /// Races the caller should treat as "already done".
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            ProgressionError::AlreadyHatched { .. } | ProgressionError::DuplicateSession { .. }
        )
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
                ) =>
            {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
