//! Channel registry
//!
//! The registry is the sole owner of every [`Channel`]. It keeps the names
//! unique and dictionary-ordered, and fans lifecycle changes out to the
//! transport, subscription, program-guide, recording and auto-record
//! subsystems and to the persistence store.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use chanreg_core::registry::{ChannelRegistry, Collaborators};
//! use chanreg_core::store::MemoryStore;
//!
//! let registry = ChannelRegistry::new(Arc::new(MemoryStore::new()), Collaborators::detached());
//!
//! let bbc = registry.find_or_create("BBC One", true)?;
//! registry.rename(bbc.tag, "BBC One HD")?;
//! assert_eq!(registry.lookup_by_tag(bbc.tag)?.name, "BBC One HD");
//! # Ok::<(), chanreg_core::Error>(())
//! ```
//!
//! ## Locking
//!
//! One `RwLock` guards the name index and all channel metadata. Mutations
//! hold the write lock for their whole duration, collaborator calls
//! included, so collaborators must never call back into the registry.
//! Lookups and iteration share the read lock.
//!
//! ## Faults
//!
//! A broken invariant (a duplicate name reaching the index, a channel
//! vanishing mid-operation) is reported as [`Error::Inconsistent`] and halts
//! the registry: every later mutation fails with the same error so the
//! owning process can restart.

mod collaborators;
mod events;

pub use collaborators::{Collaborators, Detached};
pub use events::RegistryEvent;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::channel::{Channel, ChannelRecord, ChannelTag, CommercialDetect};
use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::index::NameIndex;
use crate::natural::NaturalKey;
use crate::traits::PersistenceStore;

/// Directory of named broadcast channels
pub struct ChannelRegistry {
    state: RwLock<RegistryState>,
    store: Arc<dyn PersistenceStore>,
    collaborators: Collaborators,
    events: broadcast::Sender<RegistryEvent>,
}

#[derive(Debug)]
struct RegistryState {
    index: NameIndex,
    /// Next legacy index; only ever increases
    next_index: u32,
    /// Next tag; only ever increases
    next_tag: u32,
    /// Set once an invariant violation was detected
    halted: Option<String>,
}

impl ChannelRegistry {
    /// Create an empty registry
    pub fn new(store: Arc<dyn PersistenceStore>, collaborators: Collaborators) -> Self {
        Self::with_event_capacity(store, collaborators, RegistryConfig::default().event_channel_capacity)
    }

    /// Create an empty registry from configuration, opening its store
    pub fn from_config(config: &RegistryConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        let store = config.store.open()?;
        Ok(Self::with_event_capacity(store, collaborators, config.event_channel_capacity))
    }

    fn with_event_capacity(
        store: Arc<dyn PersistenceStore>,
        collaborators: Collaborators,
        capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            state: RwLock::new(RegistryState {
                index: NameIndex::new(),
                next_index: 0,
                next_tag: 1,
                halted: None,
            }),
            store,
            collaborators,
            events,
        }
    }

    /// Receive registry events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Restore channels from the persistence store
    ///
    /// Each stored record is find-or-created by name and its icon and
    /// commercial detection mode applied. Nothing is written back. Returns
    /// the number of records applied.
    pub fn load(&self) -> Result<usize> {
        let mut records = self.store.load_all()?;
        records.sort_by(|(a, _), (b, _)| NaturalKey::new(a.as_str()).cmp(&NaturalKey::new(b.as_str())));

        let mut state = self.write()?;
        let mut restored = 0;

        for (name, record) in records {
            if name.is_empty() {
                warn!("Skipping stored channel record with empty name");
                continue;
            }
            if !state.index.contains(&name) {
                self.create_locked(&mut state, &name)?;
            }
            if let Some(channel) = state.index.get_mut(&name) {
                channel.apply_record(&record);
                restored += 1;
            }
        }

        info!("Loaded {} channel(s) from store", restored);
        Ok(restored)
    }

    /// Flush the persistence store
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Look up a channel by exact name, creating it when absent and `create`
    /// is set
    ///
    /// # Returns
    ///
    /// - `Ok(Channel)`: The existing or newly created channel
    /// - `Err(Error::NotFound)`: Absent and `create` is false; nothing changed
    /// - `Err(Error::InvalidInput)`: Creation of an empty name was requested
    pub fn find_or_create(&self, name: &str, create: bool) -> Result<Channel> {
        if !create {
            let state = self.read()?;
            return state
                .index
                .get(name)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("'{}'", name)));
        }

        if name.is_empty() {
            return Err(Error::invalid_input("channel name cannot be empty"));
        }

        let mut state = self.write()?;
        if let Some(channel) = state.index.get(name) {
            return Ok(channel.clone());
        }
        self.create_locked(&mut state, name)
    }

    /// Look up a channel by its legacy numeric index
    ///
    /// Linear scan; meant for small administrative registries.
    pub fn lookup_by_index(&self, index: u32) -> Result<Channel> {
        let state = self.read()?;
        state
            .index
            .find_by(|ch| ch.index == index)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("index {}", index)))
    }

    /// Look up a channel by tag
    ///
    /// Linear scan; meant for small administrative registries.
    pub fn lookup_by_tag(&self, tag: ChannelTag) -> Result<Channel> {
        let state = self.read()?;
        state
            .index
            .find_by(|ch| ch.tag == tag)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("tag {}", tag)))
    }

    /// All channels in dictionary order of their names
    pub fn channels(&self) -> Result<Vec<Channel>> {
        let state = self.read()?;
        Ok(state.index.iter().cloned().collect())
    }

    /// Number of channels
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.index.len())
    }

    /// Whether the registry holds no channels
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Rename a channel
    ///
    /// The persisted record moves to the new name and every attached
    /// transport gets the new name and a config-changed notification.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Renamed
    /// - `Err(Error::Conflict)`: Another channel already has `new_name`;
    ///   nothing changed
    /// - `Err(Error::NotFound)`: No channel with this tag
    pub fn rename(&self, tag: ChannelTag, new_name: &str) -> Result<()> {
        if new_name.is_empty() {
            return Err(Error::invalid_input("channel name cannot be empty"));
        }

        let mut state = self.write()?;
        let old_name = Self::name_of(&state, tag)?;

        if let Some(other) = state.index.get(new_name) {
            if other.tag != tag {
                return Err(Error::conflict(format!(
                    "'{}' is already used by channel {}",
                    new_name, other.tag
                )));
            }
        }

        self.persist_remove(&old_name);

        let Some(mut channel) = state.index.remove(&old_name) else {
            return Err(Self::halt(&mut state, format!("channel {} vanished during rename", tag)));
        };
        channel.set_name(new_name);
        let record = channel.record();

        if state.index.insert(channel).is_err() {
            return Err(Self::halt(
                &mut state,
                format!("duplicate name '{}' on reinsert of channel {}", new_name, tag),
            ));
        }

        let transports = &self.collaborators.transports;
        for transport in transports.transports_of(tag) {
            transports.set_channel_name(&transport, new_name);
            transports.notify_config_changed(&transport);
        }

        self.persist_save(new_name, &record);

        info!("Renamed channel {} from '{}' to '{}'", tag, old_name, new_name);
        self.emit(RegistryEvent::Renamed {
            tag,
            old_name,
            new_name: new_name.to_string(),
        });
        Ok(())
    }

    /// Replace a channel's icon and persist it
    pub fn set_icon(&self, tag: ChannelTag, icon: Option<&str>) -> Result<()> {
        self.update(tag, |channel| channel.icon = icon.map(str::to_string))
    }

    /// Replace a channel's commercial detection mode and persist it
    pub fn set_commercial_detect(&self, tag: ChannelTag, mode: CommercialDetect) -> Result<()> {
        self.update(tag, |channel| channel.commercial_detect = mode)
    }

    /// Move every transport of `source` onto `destination`, then delete
    /// `source`
    ///
    /// All transports are moved before the delete runs, so the delete finds
    /// none left on `source`.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Merged; `source` no longer exists
    /// - `Err(Error::NotFound)`: Either tag is unknown; nothing changed
    /// - `Err(Error::Conflict)`: `destination` and `source` are the same
    ///   channel; nothing changed
    pub fn merge(&self, destination: ChannelTag, source: ChannelTag) -> Result<()> {
        if destination == source {
            return Err(Error::conflict(format!(
                "cannot merge channel {} into itself",
                source
            )));
        }

        let mut state = self.write()?;
        let destination_name = Self::name_of(&state, destination)?;
        let source_name = Self::name_of(&state, source)?;

        let transports = &self.collaborators.transports;
        let moved = transports.transports_of(source);
        for transport in &moved {
            transports.detach(transport);
            transports.attach(transport, destination, &destination_name);
            transports.notify_config_changed(transport);
        }

        self.delete_locked(&mut state, source)?;

        info!(
            "Merged channel '{}' into '{}' ({} transport(s))",
            source_name,
            destination_name,
            moved.len()
        );
        self.emit(RegistryEvent::Merged {
            destination,
            source,
            transports_moved: moved.len(),
        });
        self.emit(RegistryEvent::Deleted {
            tag: source,
            name: source_name,
        });
        Ok(())
    }

    /// Delete a channel
    ///
    /// Steps, in order:
    /// 1. destroy recordings of the channel
    /// 2. unmap every transport and notify it
    /// 3. unbind every subscription (subscriptions survive)
    /// 4. purge program-guide events
    /// 5. purge auto-record rules
    /// 6. remove the persisted record
    /// 7. remove the channel from the index and release it
    pub fn delete(&self, tag: ChannelTag) -> Result<()> {
        let mut state = self.write()?;
        let name = self.delete_locked(&mut state, tag)?;
        self.emit(RegistryEvent::Deleted { tag, name });
        Ok(())
    }

    /// Run the delete steps and return the released name; emits nothing
    fn delete_locked(&self, state: &mut RegistryState, tag: ChannelTag) -> Result<String> {
        let name = Self::name_of(state, tag)?;
        let collaborators = &self.collaborators;

        if let Err(e) = collaborators.recordings.destroy_recordings_for_channel(tag) {
            warn!("Failed to destroy recordings of channel '{}': {}", name, e);
        }

        for transport in collaborators.transports.transports_of(tag) {
            collaborators.transports.detach(&transport);
            collaborators.transports.notify_config_changed(&transport);
        }

        for subscription in collaborators.subscriptions.subscriptions_of(tag) {
            collaborators.subscriptions.unbind(subscription);
        }

        if let Err(e) = collaborators.program_guide.purge_events_for_channel(tag) {
            warn!("Failed to purge program guide of channel '{}': {}", name, e);
        }

        if let Err(e) = collaborators.auto_record.destroy_rules_for_channel(tag) {
            warn!("Failed to purge auto-record rules of channel '{}': {}", name, e);
        }

        self.persist_remove(&name);

        if state.index.remove(&name).is_none() {
            return Err(Self::halt(state, format!("channel {} vanished during delete", tag)));
        }

        info!("Deleted channel '{}' ({})", name, tag);
        Ok(name)
    }

    fn update<F>(&self, tag: ChannelTag, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Channel),
    {
        let mut state = self.write()?;
        let name = Self::name_of(&state, tag)?;

        let Some(channel) = state.index.get_mut(&name) else {
            return Err(Self::halt(&mut state, format!("channel {} vanished during update", tag)));
        };
        apply(&mut *channel);
        let record = channel.record();

        self.persist_save(&name, &record);
        self.emit(RegistryEvent::Updated { tag });
        Ok(())
    }

    fn create_locked(&self, state: &mut RegistryState, name: &str) -> Result<Channel> {
        let Some(next_tag) = state.next_tag.checked_add(1) else {
            return Err(Self::halt(state, "channel tag space exhausted".to_string()));
        };
        let Some(next_index) = state.next_index.checked_add(1) else {
            return Err(Self::halt(state, "channel index space exhausted".to_string()));
        };

        let channel = Channel::new(state.next_index, ChannelTag(state.next_tag), name);
        state.next_tag = next_tag;
        state.next_index = next_index;

        if state.index.insert(channel.clone()).is_err() {
            return Err(Self::halt(state, format!("duplicate name '{}' on create", name)));
        }

        debug!(
            "Created channel '{}' (tag {}, index {})",
            channel.name, channel.tag, channel.index
        );
        self.emit(RegistryEvent::Created {
            tag: channel.tag,
            name: channel.name.clone(),
        });
        Ok(channel)
    }

    fn name_of(state: &RegistryState, tag: ChannelTag) -> Result<String> {
        state
            .index
            .find_by(|ch| ch.tag == tag)
            .map(|ch| ch.name.clone())
            .ok_or_else(|| Error::not_found(format!("tag {}", tag)))
    }

    /// Record an invariant violation and stop accepting mutations
    fn halt(state: &mut RegistryState, reason: String) -> Error {
        error!("Channel registry invariant violated: {}", reason);
        state.halted = Some(reason.clone());
        Error::inconsistent(reason)
    }

    fn persist_save(&self, name: &str, record: &ChannelRecord) {
        if let Err(e) = self.store.save(name, record) {
            warn!("Failed to persist channel '{}': {}", name, e);
        }
    }

    fn persist_remove(&self, name: &str) {
        if let Err(e) = self.store.remove(name) {
            warn!("Failed to remove persisted channel '{}': {}", name, e);
        }
    }

    fn emit(&self, event: RegistryEvent) {
        // No receivers is not an error
        let _ = self.events.send(event);
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|_| Error::inconsistent("registry lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryState>> {
        let state = self
            .state
            .write()
            .map_err(|_| Error::inconsistent("registry lock poisoned"))?;
        if let Some(reason) = &state.halted {
            return Err(Error::inconsistent(format!("registry halted: {}", reason)));
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry() -> (ChannelRegistry, MemoryStore) {
        let store = MemoryStore::new();
        let registry = ChannelRegistry::new(Arc::new(store.clone()), Collaborators::detached());
        (registry, store)
    }

    #[test]
    fn find_without_create_is_not_found() {
        let (registry, _) = registry();
        let err = registry.find_or_create("ARD", false).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn find_or_create_is_idempotent() {
        let (registry, _) = registry();
        let first = registry.find_or_create("ARD", true).unwrap();
        let second = registry.find_or_create("ARD", true).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len().unwrap(), 1);
        assert_eq!(first.slug, "ard");
    }

    #[test]
    fn empty_name_is_rejected() {
        let (registry, _) = registry();
        assert!(matches!(
            registry.find_or_create("", true),
            Err(Error::InvalidInput(_))
        ));
        let ch = registry.find_or_create("ARD", true).unwrap();
        assert!(matches!(registry.rename(ch.tag, ""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn indexes_and_tags_are_never_reused() {
        let (registry, _) = registry();
        let a = registry.find_or_create("A", true).unwrap();
        let b = registry.find_or_create("B", true).unwrap();
        registry.delete(a.tag).unwrap();
        let c = registry.find_or_create("C", true).unwrap();

        assert_ne!(c.index, a.index);
        assert_ne!(c.index, b.index);
        assert_ne!(c.tag, a.tag);
        assert_eq!(registry.lookup_by_index(b.index).unwrap().tag, b.tag);
        assert!(registry.lookup_by_index(a.index).is_err());
    }

    #[test]
    fn set_icon_and_mode_persist() {
        let (registry, store) = registry();
        let ch = registry.find_or_create("Das Erste", true).unwrap();

        registry.set_icon(ch.tag, Some("ard.png")).unwrap();
        registry
            .set_commercial_detect(ch.tag, CommercialDetect::Ttp192)
            .unwrap();

        let record = store.get("Das Erste").unwrap();
        assert_eq!(record.icon, "ard.png");
        assert_eq!(record.commercial_detect, CommercialDetect::Ttp192);

        registry.set_icon(ch.tag, None).unwrap();
        assert_eq!(registry.lookup_by_tag(ch.tag).unwrap().icon, None);
        assert_eq!(store.get("Das Erste").unwrap().icon, "");
    }

    #[test]
    fn operations_on_unknown_tag_are_not_found() {
        let (registry, _) = registry();
        let ghost = ChannelTag(42);
        assert!(matches!(registry.rename(ghost, "x"), Err(Error::NotFound(_))));
        assert!(matches!(registry.set_icon(ghost, None), Err(Error::NotFound(_))));
        assert!(matches!(registry.delete(ghost), Err(Error::NotFound(_))));
        assert!(matches!(registry.lookup_by_tag(ghost), Err(Error::NotFound(_))));
    }

    #[test]
    fn merge_into_self_is_conflict() {
        let (registry, _) = registry();
        let ch = registry.find_or_create("ZDF", true).unwrap();
        assert!(matches!(registry.merge(ch.tag, ch.tag), Err(Error::Conflict(_))));
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn halted_registry_refuses_mutations() {
        let (registry, _) = registry();
        let ch = registry.find_or_create("ZDF", true).unwrap();
        {
            let mut state = registry.state.write().unwrap();
            ChannelRegistry::halt(&mut state, "test fault".to_string());
        }

        let err = registry.find_or_create("ARD", true).unwrap_err();
        assert!(err.is_fatal());
        assert!(registry.rename(ch.tag, "ZDF HD").unwrap_err().is_fatal());
        // Reads keep working
        assert_eq!(registry.lookup_by_tag(ch.tag).unwrap().name, "ZDF");
    }

    #[test]
    fn events_are_broadcast() {
        let (registry, _) = registry();
        let mut rx = registry.subscribe();

        let ch = registry.find_or_create("ARD", true).unwrap();
        registry.rename(ch.tag, "Das Erste").unwrap();
        registry.delete(ch.tag).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent::Created {
                tag: ch.tag,
                name: "ARD".to_string()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent::Renamed {
                tag: ch.tag,
                old_name: "ARD".to_string(),
                new_name: "Das Erste".to_string()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent::Deleted {
                tag: ch.tag,
                name: "Das Erste".to_string()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    /// Records whether any event had been broadcast when recordings were purged
    struct EventWatcher {
        rx: std::sync::Mutex<Option<broadcast::Receiver<RegistryEvent>>>,
        seen_during_purge: std::sync::Mutex<Vec<RegistryEvent>>,
    }

    impl crate::traits::RecordingStore for EventWatcher {
        fn destroy_recordings_for_channel(&self, _channel: ChannelTag) -> Result<()> {
            if let Some(rx) = self.rx.lock().unwrap().as_mut() {
                while let Ok(event) = rx.try_recv() {
                    self.seen_during_purge.lock().unwrap().push(event);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn merge_is_announced_only_after_source_is_deleted() {
        let watcher = Arc::new(EventWatcher {
            rx: std::sync::Mutex::new(None),
            seen_during_purge: std::sync::Mutex::new(Vec::new()),
        });
        let registry = ChannelRegistry::new(
            Arc::new(MemoryStore::new()),
            Collaborators::detached().with_recordings(watcher.clone()),
        );
        let dst = registry.find_or_create("ARD", true).unwrap();
        let src = registry.find_or_create("Das Erste", true).unwrap();
        *watcher.rx.lock().unwrap() = Some(registry.subscribe());
        let mut rx = registry.subscribe();

        registry.merge(dst.tag, src.tag).unwrap();

        assert!(watcher.seen_during_purge.lock().unwrap().is_empty());
        assert!(matches!(rx.try_recv().unwrap(), RegistryEvent::Merged { .. }));
        assert!(matches!(rx.try_recv().unwrap(), RegistryEvent::Deleted { .. }));
    }

    #[test]
    fn len_reports_poisoned_lock() {
        let (registry, _) = registry();
        registry.find_or_create("ARD", true).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = registry.state.write().unwrap();
            panic!("poison the registry lock");
        }));
        assert!(result.is_err());

        assert!(matches!(registry.len(), Err(Error::Inconsistent(_))));
        assert!(registry.is_empty().is_err());
    }

    #[test]
    fn load_restores_records_without_rewriting() {
        let store = MemoryStore::new();
        store
            .save(
                "Ch10",
                &ChannelRecord {
                    icon: "ten.png".to_string(),
                    commercial_detect: CommercialDetect::Ttp192,
                },
            )
            .unwrap();
        store.save("Ch2", &ChannelRecord::default()).unwrap();

        let registry = ChannelRegistry::new(Arc::new(store.clone()), Collaborators::detached());
        assert_eq!(registry.load().unwrap(), 2);

        let channels = registry.channels().unwrap();
        let names: Vec<&str> = channels.iter().map(|ch| ch.name.as_str()).collect();
        assert_eq!(names, vec!["Ch2", "Ch10"]);
        assert_eq!(channels[0].index, 0);
        assert_eq!(channels[1].icon.as_deref(), Some("ten.png"));
        assert_eq!(channels[1].commercial_detect, CommercialDetect::Ttp192);
        assert_eq!(store.len(), 2);
    }
}
