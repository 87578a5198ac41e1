//! Test doubles and common utilities for registry contract tests
//!
//! Every double appends to a shared [`CallLog`] so tests can assert both
//! what was called and in which order.

#![allow(dead_code)]

use chanreg_core::channel::{ChannelRecord, ChannelTag};
use chanreg_core::registry::{ChannelRegistry, Collaborators};
use chanreg_core::store::MemoryStore;
use chanreg_core::traits::{
    AutoRecordStore, PersistenceStore, ProgramGuideStore, RecordingStore, SubscriptionId,
    SubscriptionOwner, TransportId, TransportOwner,
};
use chanreg_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of collaborator calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// Number of entries equal to `entry`
    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

/// What the transport subsystem knows about one transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportState {
    pub channel: Option<ChannelTag>,
    pub channel_name: Option<String>,
    pub config_changes: usize,
}

/// Transport subsystem double
pub struct MockTransports {
    transports: Mutex<BTreeMap<TransportId, TransportState>>,
    log: CallLog,
}

impl MockTransports {
    pub fn new(log: CallLog) -> Self {
        Self {
            transports: Mutex::new(BTreeMap::new()),
            log,
        }
    }

    /// Register a transport mapped to `channel`
    pub fn add(&self, id: &str, channel: ChannelTag, channel_name: &str) {
        self.transports.lock().unwrap().insert(
            TransportId::new(id),
            TransportState {
                channel: Some(channel),
                channel_name: Some(channel_name.to_string()),
                config_changes: 0,
            },
        );
    }

    /// Current state of a transport; panics if it was destroyed
    pub fn state(&self, id: &str) -> TransportState {
        self.transports
            .lock()
            .unwrap()
            .get(&TransportId::new(id))
            .cloned()
            .expect("transport still exists")
    }

    pub fn ids_on(&self, channel: ChannelTag) -> Vec<String> {
        self.transports_of(channel).into_iter().map(|t| t.0).collect()
    }

    fn with<F: FnOnce(&mut TransportState)>(&self, id: &TransportId, f: F) {
        let mut transports = self.transports.lock().unwrap();
        let state = transports.get_mut(id).expect("known transport");
        f(state);
    }
}

impl TransportOwner for MockTransports {
    fn transports_of(&self, channel: ChannelTag) -> Vec<TransportId> {
        self.transports
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, state)| state.channel == Some(channel))
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn detach(&self, transport: &TransportId) {
        self.log.push(format!("detach:{}", transport));
        self.with(transport, |state| {
            state.channel = None;
            state.channel_name = None;
        });
    }

    fn attach(&self, transport: &TransportId, channel: ChannelTag, channel_name: &str) {
        self.log.push(format!("attach:{}->{}", transport, channel));
        self.with(transport, |state| {
            state.channel = Some(channel);
            state.channel_name = Some(channel_name.to_string());
        });
    }

    fn set_channel_name(&self, transport: &TransportId, channel_name: &str) {
        self.log.push(format!("rename:{}", transport));
        self.with(transport, |state| {
            state.channel_name = Some(channel_name.to_string())
        });
    }

    fn notify_config_changed(&self, transport: &TransportId) {
        self.log.push(format!("notify:{}", transport));
        self.with(transport, |state| state.config_changes += 1);
    }
}

/// Subscription subsystem double
pub struct MockSubscriptions {
    bindings: Mutex<BTreeMap<SubscriptionId, Option<ChannelTag>>>,
    log: CallLog,
}

impl MockSubscriptions {
    pub fn new(log: CallLog) -> Self {
        Self {
            bindings: Mutex::new(BTreeMap::new()),
            log,
        }
    }

    pub fn bind(&self, id: u64, channel: ChannelTag) {
        self.bindings
            .lock()
            .unwrap()
            .insert(SubscriptionId(id), Some(channel));
    }

    /// Channel of a subscription; `None` if unbound. Panics if destroyed.
    pub fn channel_of(&self, id: u64) -> Option<ChannelTag> {
        *self
            .bindings
            .lock()
            .unwrap()
            .get(&SubscriptionId(id))
            .expect("subscription still exists")
    }
}

impl SubscriptionOwner for MockSubscriptions {
    fn subscriptions_of(&self, channel: ChannelTag) -> Vec<SubscriptionId> {
        self.bindings
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, bound)| **bound == Some(channel))
            .map(|(id, _)| *id)
            .collect()
    }

    fn unbind(&self, subscription: SubscriptionId) {
        self.log.push(format!("unbind:{}", subscription.0));
        if let Some(bound) = self.bindings.lock().unwrap().get_mut(&subscription) {
            *bound = None;
        }
    }
}

/// Program-guide, recording and auto-record double
pub struct MockPurges {
    log: CallLog,
    fail: AtomicBool,
}

impl MockPurges {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail: AtomicBool::new(false),
        }
    }

    /// Make every purge report an error (after logging it)
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn record(&self, entry: String) -> Result<()> {
        self.log.push(entry);
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::Other("purge refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RecordingStore for MockPurges {
    fn destroy_recordings_for_channel(&self, channel: ChannelTag) -> Result<()> {
        self.record(format!("recordings:{}", channel))
    }
}

impl ProgramGuideStore for MockPurges {
    fn purge_events_for_channel(&self, channel: ChannelTag) -> Result<()> {
        self.record(format!("epg:{}", channel))
    }
}

impl AutoRecordStore for MockPurges {
    fn destroy_rules_for_channel(&self, channel: ChannelTag) -> Result<()> {
        self.record(format!("autorec:{}", channel))
    }
}

/// Persistence store spy over a [`MemoryStore`]
pub struct SpyStore {
    pub inner: MemoryStore,
    log: CallLog,
    fail: AtomicBool,
}

impl SpyStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: MemoryStore::new(),
            log,
            fail: AtomicBool::new(false),
        }
    }

    /// Make every write fail
    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::persistence("disk full"))
        } else {
            Ok(())
        }
    }
}

impl PersistenceStore for SpyStore {
    fn save(&self, channel_name: &str, record: &ChannelRecord) -> Result<()> {
        self.log.push(format!("store.save:{}", channel_name));
        self.check()?;
        self.inner.save(channel_name, record)
    }

    fn remove(&self, channel_name: &str) -> Result<()> {
        self.log.push(format!("store.remove:{}", channel_name));
        self.check()?;
        self.inner.remove(channel_name)
    }

    fn load_all(&self) -> Result<Vec<(String, ChannelRecord)>> {
        self.inner.load_all()
    }
}

/// Registry wired to a full set of doubles
pub struct Harness {
    pub registry: ChannelRegistry,
    pub log: CallLog,
    pub transports: Arc<MockTransports>,
    pub subscriptions: Arc<MockSubscriptions>,
    pub purges: Arc<MockPurges>,
    pub store: Arc<SpyStore>,
}

impl Harness {
    pub fn new() -> Self {
        let log = CallLog::default();
        let transports = Arc::new(MockTransports::new(log.clone()));
        let subscriptions = Arc::new(MockSubscriptions::new(log.clone()));
        let purges = Arc::new(MockPurges::new(log.clone()));
        let store = Arc::new(SpyStore::new(log.clone()));

        let collaborators = Collaborators::detached()
            .with_transports(transports.clone())
            .with_subscriptions(subscriptions.clone())
            .with_program_guide(purges.clone())
            .with_recordings(purges.clone())
            .with_auto_record(purges.clone());

        let registry = ChannelRegistry::new(store.clone(), collaborators);

        Self {
            registry,
            log,
            transports,
            subscriptions,
            purges,
            store,
        }
    }

    /// Names currently in the registry, in iteration order
    pub fn names(&self) -> Vec<String> {
        self.registry
            .channels()
            .unwrap()
            .into_iter()
            .map(|ch| ch.name)
            .collect()
    }
}
