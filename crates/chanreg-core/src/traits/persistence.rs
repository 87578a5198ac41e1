// # Persistence Store Trait
//
// Defines the interface for durable per-channel records.
//
// ## Purpose
//
// Each channel has one record holding its icon and commercial detection
// mode, keyed by the channel's current display name. A rename relocates the
// record to the new key.
//
// ## Implementations
//
// - `FileStore`: single JSON document with atomic writes and backup
// - `MemoryStore`: non-persistent, for tests and ephemeral deployments
//
// ## Usage
//
// ```rust
// use chanreg_core::channel::ChannelRecord;
// use chanreg_core::store::MemoryStore;
// use chanreg_core::traits::PersistenceStore;
//
// let store = MemoryStore::new();
// store.save("BBC One", &ChannelRecord::default()).unwrap();
// assert_eq!(store.load_all().unwrap().len(), 1);
// ```

use crate::channel::ChannelRecord;

/// Trait for channel record stores
///
/// Writes are fire-and-forget from the registry's point of view: a failure
/// is logged and the in-memory change stays committed.
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently.
///
/// ## Implementation Guidelines
///
/// - **Durable on return**: `save` and `remove` should be persisted when they
///   return `Ok`, or buffered until `flush`
/// - **Idempotent remove**: removing a missing record is not an error
/// - **No business logic**: naming rules belong to the registry
pub trait PersistenceStore: Send + Sync {
    /// Create or replace the record stored under `channel_name`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Record written
    /// - `Err(Error)`: Storage error
    fn save(&self, channel_name: &str, record: &ChannelRecord) -> Result<(), crate::Error>;

    /// Remove the record stored under `channel_name`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Removed (or didn't exist)
    /// - `Err(Error)`: Storage error
    fn remove(&self, channel_name: &str) -> Result<(), crate::Error>;

    /// Every stored record with its channel name
    fn load_all(&self) -> Result<Vec<(String, ChannelRecord)>, crate::Error>;

    /// Persist any pending changes
    fn flush(&self) -> Result<(), crate::Error> {
        Ok(())
    }
}
