use super::{CapacityConfig, CapacityStore, StoreError};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

/// Capacity configuration kept as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCapacityStore {
    path: PathBuf,
}

impl JsonFileCapacityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CapacityStore for JsonFileCapacityStore {
    /// A missing file is an empty configuration.
    fn load(&self) -> Result<CapacityConfig, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no capacity store yet");
                return Ok(CapacityConfig::new());
            }
            Err(err) => return Err(err.into()),
        };

        let config: CapacityConfig = serde_json::from_str(&contents)?;
        info!(path = %self.path.display(), clubs = config.len(), "capacities loaded");
        Ok(config)
    }

    fn save(&self, config: &CapacityConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(config)?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        info!(path = %self.path.display(), clubs = config.len(), "capacities saved");
        Ok(())
    }
}
