//! Configuration types for the channel registry

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{FileStore, MemoryStore};
use crate::traits::PersistenceStore;

/// Main registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Where channel records are persisted
    #[serde(default)]
    pub store: StoreConfig,

    /// Capacity of the registry event channel
    ///
    /// Receivers that fall further behind than this miss events.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl RegistryConfig {
    /// Create a configuration with defaults (memory store)
    pub fn new() -> Self {
        Self {
            store: StoreConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Use a different store
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.store.validate()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Persistence store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file store
    File {
        /// Path to the store document
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("File store path cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Store type name
    pub fn type_name(&self) -> &'static str {
        match self {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
        }
    }

    /// Open the configured store
    pub fn open(&self) -> Result<Arc<dyn PersistenceStore>, crate::Error> {
        self.validate()?;

        match self {
            StoreConfig::File { path } => Ok(Arc::new(FileStore::open(path)?)),
            StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    256
}
