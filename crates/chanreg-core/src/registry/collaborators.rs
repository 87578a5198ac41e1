//! Injected collaborator bundle
//!
//! The registry reaches every other subsystem through the capabilities held
//! here. Anything not supplied falls back to [`Detached`], which owns
//! nothing and accepts every request.

use std::sync::Arc;

use crate::channel::ChannelTag;
use crate::traits::{
    AutoRecordStore, ProgramGuideStore, RecordingStore, SubscriptionId, SubscriptionOwner,
    TransportId, TransportOwner,
};

/// Capabilities the registry notifies as channels change
#[derive(Clone)]
pub struct Collaborators {
    /// Transport → channel mapping
    pub transports: Arc<dyn TransportOwner>,
    /// Subscription → channel binding
    pub subscriptions: Arc<dyn SubscriptionOwner>,
    /// Program-guide events
    pub program_guide: Arc<dyn ProgramGuideStore>,
    /// Recordings
    pub recordings: Arc<dyn RecordingStore>,
    /// Auto-record rules
    pub auto_record: Arc<dyn AutoRecordStore>,
}

impl Collaborators {
    /// Bundle where every collaborator is [`Detached`]
    pub fn detached() -> Self {
        let detached = Arc::new(Detached);
        Self {
            transports: detached.clone(),
            subscriptions: detached.clone(),
            program_guide: detached.clone(),
            recordings: detached.clone(),
            auto_record: detached,
        }
    }

    /// Set the transport owner
    pub fn with_transports(mut self, transports: Arc<dyn TransportOwner>) -> Self {
        self.transports = transports;
        self
    }

    /// Set the subscription owner
    pub fn with_subscriptions(mut self, subscriptions: Arc<dyn SubscriptionOwner>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    /// Set the program-guide store
    pub fn with_program_guide(mut self, program_guide: Arc<dyn ProgramGuideStore>) -> Self {
        self.program_guide = program_guide;
        self
    }

    /// Set the recording store
    pub fn with_recordings(mut self, recordings: Arc<dyn RecordingStore>) -> Self {
        self.recordings = recordings;
        self
    }

    /// Set the auto-record store
    pub fn with_auto_record(mut self, auto_record: Arc<dyn AutoRecordStore>) -> Self {
        self.auto_record = auto_record;
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::detached()
    }
}

/// Collaborator that owns nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl TransportOwner for Detached {
    fn transports_of(&self, _channel: ChannelTag) -> Vec<TransportId> {
        Vec::new()
    }

    fn detach(&self, _transport: &TransportId) {}

    fn attach(&self, _transport: &TransportId, _channel: ChannelTag, _channel_name: &str) {}

    fn set_channel_name(&self, _transport: &TransportId, _channel_name: &str) {}

    fn notify_config_changed(&self, _transport: &TransportId) {}
}

impl SubscriptionOwner for Detached {
    fn subscriptions_of(&self, _channel: ChannelTag) -> Vec<SubscriptionId> {
        Vec::new()
    }

    fn unbind(&self, _subscription: SubscriptionId) {}
}

impl ProgramGuideStore for Detached {
    fn purge_events_for_channel(&self, _channel: ChannelTag) -> Result<(), crate::Error> {
        Ok(())
    }
}

impl RecordingStore for Detached {
    fn destroy_recordings_for_channel(&self, _channel: ChannelTag) -> Result<(), crate::Error> {
        Ok(())
    }
}

impl AutoRecordStore for Detached {
    fn destroy_rules_for_channel(&self, _channel: ChannelTag) -> Result<(), crate::Error> {
        Ok(())
    }
}
