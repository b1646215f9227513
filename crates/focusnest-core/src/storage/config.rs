//! TOML-based application configuration.
//!
//! Stores:
//! - The owner id the CLI acts for
//! - Timer bounds and defaults
//! - Progression tuning (boost credit, hatch gating, retry budget, seed)
//! - An optional catalog override file
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::catalog::AffinityTag;
use crate::error::ConfigError;
use crate::timer::DurationBounds;

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_min_minutes")]
    pub min_minutes: u32,
    #[serde(default = "default_max_minutes")]
    pub max_minutes: u32,
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
    #[serde(default = "default_affinity")]
    pub default_affinity: AffinityTag,
    /// Milliseconds between ticks when the timer is driven in-process.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

/// Progression configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Hatch time removed per boost unit.
    #[serde(default = "default_boost_credit_minutes")]
    pub boost_credit_minutes: u32,
    /// Reject hatching before `hatch_at` according to the store clock.
    #[serde(default = "default_true")]
    pub enforce_hatch_readiness: bool,
    /// Optimistic concurrency attempts for session completion.
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,
    /// Fixed seed for reproducible reward rolls.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    /// Catalog TOML replacing the built-in birds.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

// Default functions
fn default_owner() -> String {
    "local".into()
}
fn default_min_minutes() -> u32 {
    15
}
fn default_max_minutes() -> u32 {
    180
}
fn default_minutes() -> u32 {
    25
}
fn default_affinity() -> AffinityTag {
    AffinityTag::Seed
}
fn default_tick_millis() -> u64 {
    1000
}
fn default_boost_credit_minutes() -> u32 {
    60
}
fn default_true() -> bool {
    true
}
fn default_max_commit_attempts() -> u32 {
    3
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            min_minutes: default_min_minutes(),
            max_minutes: default_max_minutes(),
            default_minutes: default_minutes(),
            default_affinity: default_affinity(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl TimerConfig {
    pub fn bounds(&self) -> DurationBounds {
        DurationBounds::new(self.min_minutes, self.max_minutes)
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            boost_credit_minutes: default_boost_credit_minutes(),
            enforce_hatch_readiness: true,
            max_commit_attempts: default_max_commit_attempts(),
            rng_seed: None,
        }
    }
}

impl ProgressionConfig {
    pub fn boost_credit(&self) -> Duration {
        Duration::minutes(i64::from(self.boost_credit_minutes))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            timer: TimerConfig::default(),
            progression: ProgressionConfig::default(),
            catalog_path: None,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    // Optional fields start out as null.
                    serde_json::Value::Null => match value {
                        "" | "none" => serde_json::Value::Null,
                        v => v
                            .parse::<u64>()
                            .map(|n| serde_json::Value::Number(n.into()))
                            .unwrap_or_else(|_| serde_json::Value::String(v.into())),
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and validate the result. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timer.min_minutes == 0 || self.timer.min_minutes > self.timer.max_minutes {
            return Err(ConfigError::InvalidValue {
                key: "timer.min_minutes".into(),
                message: format!(
                    "must be between 1 and timer.max_minutes ({})",
                    self.timer.max_minutes
                ),
            });
        }
        if self.progression.max_commit_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "progression.max_commit_attempts".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.owner.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "owner".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
