use super::{CapacityConfig, CapacityStore, StoreError};
use std::sync::{Arc, Mutex};

/// Process-local store, used by tests and when no file should be written.
#[derive(Debug, Default, Clone)]
pub struct MemoryCapacityStore {
    config: Arc<Mutex<CapacityConfig>>,
}

impl MemoryCapacityStore {
    pub fn with_config(config: CapacityConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
        }
    }
}

impl CapacityStore for MemoryCapacityStore {
    fn load(&self) -> Result<CapacityConfig, StoreError> {
        let guard = self
            .config
            .lock()
            .map_err(|_| StoreError::Unavailable("capacity mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, config: &CapacityConfig) -> Result<(), StoreError> {
        let mut guard = self
            .config
            .lock()
            .map_err(|_| StoreError::Unavailable("capacity mutex poisoned".to_string()))?;
        *guard = config.clone();
        Ok(())
    }
}
