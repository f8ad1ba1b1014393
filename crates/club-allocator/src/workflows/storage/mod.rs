//! Persisted club capacities.
//!
//! Capacities are saved independently of allocation results and loaded as the
//! baseline before each run. Store failures never touch session state.

mod file;
mod memory;

pub use file::JsonFileCapacityStore;
pub use memory::MemoryCapacityStore;

use crate::workflows::allocation::ClubKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configured `maximum` per club.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CapacityEntry>", into = "Vec<CapacityEntry>")]
pub struct CapacityConfig {
    capacities: BTreeMap<ClubKey, u32>,
}

/// Wire form of one configured capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityEntry {
    pub name: String,
    pub weekday: String,
    pub term_band: u32,
    pub maximum: u32,
}

impl CapacityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: ClubKey, maximum: u32) -> Option<u32> {
        self.capacities.insert(key, maximum)
    }

    pub fn get(&self, key: &ClubKey) -> Option<u32> {
        self.capacities.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClubKey, u32)> {
        self.capacities.iter().map(|(key, maximum)| (key, *maximum))
    }

    pub fn len(&self) -> usize {
        self.capacities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capacities.is_empty()
    }

    /// Overlays `other` on top of this configuration.
    pub fn merge(&mut self, other: &CapacityConfig) {
        for (key, maximum) in other.iter() {
            self.capacities.insert(key.clone(), maximum);
        }
    }
}

impl FromIterator<(ClubKey, u32)> for CapacityConfig {
    fn from_iter<I: IntoIterator<Item = (ClubKey, u32)>>(iter: I) -> Self {
        Self {
            capacities: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<CapacityEntry>> for CapacityConfig {
    fn from(entries: Vec<CapacityEntry>) -> Self {
        entries
            .into_iter()
            .map(|entry| {
                (
                    ClubKey::new(entry.name, entry.weekday, entry.term_band),
                    entry.maximum,
                )
            })
            .collect()
    }
}

impl From<CapacityConfig> for Vec<CapacityEntry> {
    fn from(config: CapacityConfig) -> Self {
        config
            .capacities
            .into_iter()
            .map(|(key, maximum)| CapacityEntry {
                name: key.name,
                weekday: key.weekday,
                term_band: key.term_band,
                maximum,
            })
            .collect()
    }
}

/// Storage abstraction for capacity configuration.
pub trait CapacityStore: Send + Sync {
    fn load(&self) -> Result<CapacityConfig, StoreError>;
    fn save(&self, config: &CapacityConfig) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("capacity store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("capacity store holds invalid data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("capacity store unavailable: {0}")]
    Unavailable(String),
}
