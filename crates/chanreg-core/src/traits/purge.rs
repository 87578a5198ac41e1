// # Channel-Scoped Data Stores
//
// Program-guide events, recordings and auto-record rules are owned by their
// own subsystems and keyed by `ChannelTag`. Deleting a channel asks each of
// them to drop whatever it holds for that channel.
//
// Failures are reported back so the registry can log them; they never stop
// the rest of a delete.

use crate::channel::ChannelTag;

/// Program-guide (EPG) event store
pub trait ProgramGuideStore: Send + Sync {
    /// Drop every event scheduled on `channel`
    fn purge_events_for_channel(&self, channel: ChannelTag) -> Result<(), crate::Error>;
}

/// Recording store
pub trait RecordingStore: Send + Sync {
    /// Destroy recordings scoped to `channel`
    fn destroy_recordings_for_channel(&self, channel: ChannelTag) -> Result<(), crate::Error>;
}

/// Auto-record rule store
pub trait AutoRecordStore: Send + Sync {
    /// Destroy rules scoped to `channel`
    fn destroy_rules_for_channel(&self, channel: ChannelTag) -> Result<(), crate::Error>;
}
