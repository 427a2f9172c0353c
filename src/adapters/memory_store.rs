//! In-memory configuration store.
//!
//! Implements [`ConfigPort`] over a single postcard-encoded blob held in a
//! `RefCell`.  Hosts that persist configuration elsewhere implement the
//! same port; this one backs tests and single-process deployments.

use std::cell::RefCell;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::ControllerConfig;

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw bytes, bypassing validation.
    pub fn with_raw(bytes: Vec<u8>) -> Self {
        Self {
            blob: RefCell::new(Some(bytes)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blob.borrow().is_none()
    }

    /// Size of the stored blob in bytes, 0 when empty.
    pub fn stored_len(&self) -> usize {
        self.blob.borrow().as_ref().map_or(0, Vec::len)
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        let blob = self.blob.borrow();
        let Some(bytes) = blob.as_deref() else {
            return Err(ConfigError::NotFound);
        };
        let config = ControllerConfig::from_bytes(bytes).ok_or(ConfigError::Corrupted)?;
        if let Err(e) = config.validate() {
            warn!("MemoryConfigStore: stored config no longer validates: {}", e);
            return Err(ConfigError::Corrupted);
        }
        info!("MemoryConfigStore: loaded config ({} bytes)", bytes.len());
        Ok(config)
    }

    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = config.to_bytes().ok_or(ConfigError::Corrupted)?;
        info!("MemoryConfigStore: saved config ({} bytes)", bytes.len());
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }
}
