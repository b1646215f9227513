//! Subcommand handlers.
//!
//! Every handler prints JSON to stdout. Logs go to stderr.

pub mod admin;
pub mod aviary;
pub mod catalog;
pub mod config;
pub mod eggs;
pub mod stats;
pub mod timer;

use std::sync::Arc;

use focusnest_core::gateway::DocumentStore;
use focusnest_core::{Catalog, Config, CoreError, ProgressionStore, SqliteStore, SystemClock};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a store-backed command needs.
pub struct App {
    pub config: Config,
    pub owner: String,
    pub store: Arc<dyn DocumentStore>,
    pub progression: ProgressionStore,
}

impl App {
    pub fn open(owner: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let catalog = load_catalog(&config)?;
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open()?);
        let progression = ProgressionStore::new(
            Arc::clone(&store),
            Arc::new(catalog),
            Arc::new(SystemClock),
            config.progression.clone(),
        );
        Ok(Self {
            owner: owner.unwrap_or_else(|| config.owner.clone()),
            config,
            store,
            progression,
        })
    }

    pub fn species_name<'a>(&'a self, catalog_ref: &'a str) -> &'a str {
        self.progression
            .catalog()
            .get(catalog_ref)
            .map_or(catalog_ref, |entry| entry.name.as_str())
    }
}

pub fn load_catalog(config: &Config) -> Result<Catalog, Box<dyn std::error::Error>> {
    match &config.catalog_path {
        Some(path) => Ok(Catalog::load(path)?),
        None => Ok(Catalog::builtin()),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print benign races as a status object; propagate everything else.
pub fn benign_or_fail(err: CoreError) -> CliResult {
    if err.is_benign() {
        print_json(&serde_json::json!({
            "status": "ignored",
            "reason": err.to_string(),
        }))
    } else {
        Err(err.into())
    }
}

/// `HH:MM:SS` for a non-negative duration.
pub fn format_hms(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
