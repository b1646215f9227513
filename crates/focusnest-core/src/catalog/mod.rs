//! Static registry of collectible species.
//!
//! The catalog is loaded once at startup and never mutated. Validation
//! happens in [`Catalog::new`], so a catalog missing a rarity tier is
//! rejected at load time instead of failing a reward roll later.

mod entries;
mod rarity;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub use rarity::{AffinityTag, Rarity, RarityProfile};

/// Definition of one collectible species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: String,
    pub rarity: Rarity,
    pub affinity: AffinityTag,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub habitat: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    entries: Vec<CatalogEntry>,
}

/// Validated, read-only set of catalog entries.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and missing rarity tiers.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::DuplicateEntry(entry.id.clone()));
            }
        }
        for rarity in Rarity::ALL {
            if !entries.iter().any(|e| e.rarity == rarity) {
                return Err(CatalogError::MissingRarity(rarity));
            }
        }
        Ok(Self { entries })
    }

    /// The twelve built-in birds, one per rarity and affinity.
    pub fn builtin() -> Self {
        Self {
            entries: entries::builtin_entries(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(file.entries)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Like [`Catalog::get`] but reports unknown ids as an error.
    pub fn require(&self, id: &str) -> Result<&CatalogEntry, CatalogError> {
        self.get(id)
            .ok_or_else(|| CatalogError::UnknownEntry(id.to_string()))
    }

    pub fn by_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.rarity == rarity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
