// # Memory Store
//
// In-memory implementation of PersistenceStore.
//
// Records live only as long as the process. Useful for tests and for
// deployments where channel settings are re-seeded at start-up.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::Error;
use crate::channel::ChannelRecord;
use crate::traits::PersistenceStore;

/// In-memory record store
///
/// Clones share the same underlying map.
///
/// # Example
///
/// ```rust
/// use chanreg_core::channel::{ChannelRecord, CommercialDetect};
/// use chanreg_core::store::MemoryStore;
/// use chanreg_core::traits::PersistenceStore;
///
/// let store = MemoryStore::new();
/// let record = ChannelRecord {
///     icon: "ard.png".to_string(),
///     commercial_detect: CommercialDetect::None,
/// };
/// store.save("Das Erste", &record).unwrap();
/// assert_eq!(store.get("Das Erste"), Some(record));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, ChannelRecord>>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record stored under `channel_name`, if any
    pub fn get(&self, channel_name: &str) -> Option<ChannelRecord> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.get(channel_name).cloned())
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.inner.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceStore for MemoryStore {
    fn save(&self, channel_name: &str, record: &ChannelRecord) -> Result<(), Error> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| Error::persistence("memory store lock poisoned"))?;
        guard.insert(channel_name.to_string(), record.clone());
        Ok(())
    }

    fn remove(&self, channel_name: &str) -> Result<(), Error> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| Error::persistence("memory store lock poisoned"))?;
        guard.remove(channel_name);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(String, ChannelRecord)>, Error> {
        let guard = self
            .inner
            .read()
            .map_err(|_| Error::persistence("memory store lock poisoned"))?;
        Ok(guard
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect())
    }
}
