// # Transport Owner Trait
//
// Defines the narrow interface the registry uses to reach the
// tuning/transport subsystem.
//
// ## Purpose
//
// Transports (tunable physical or network sources) are mapped to channels by
// the transport subsystem, which owns the mapping. The registry only needs to
// enumerate a channel's transports and move, unmap or notify them when the
// channel is renamed, merged or deleted.
//
// A transport remembers its channel by `ChannelTag` and keeps a cached copy
// of the channel name for display; it never holds a reference to the channel.

use std::fmt;

use crate::channel::ChannelTag;

/// Identifier of a transport within the transport subsystem
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportId(pub String);

impl TransportId {
    /// Create a transport identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner of the transport → channel mapping
///
/// All methods are called while the registry holds its exclusive lock.
/// Implementations must not call back into the registry.
///
/// # Ownership
///
/// - Transports are never destroyed by the registry, only unmapped or moved
/// - The registry never caches the list returned by [`transports_of`](Self::transports_of)
///   across operations
pub trait TransportOwner: Send + Sync {
    /// Transports currently mapped to `channel`
    fn transports_of(&self, channel: ChannelTag) -> Vec<TransportId>;

    /// Unmap a transport from its channel
    ///
    /// Afterwards the transport has no channel and is not returned by
    /// `transports_of` for any channel.
    fn detach(&self, transport: &TransportId);

    /// Map a transport onto `channel`, caching `channel_name`
    fn attach(&self, transport: &TransportId, channel: ChannelTag, channel_name: &str);

    /// Replace the transport's cached copy of its channel name
    fn set_channel_name(&self, transport: &TransportId, channel_name: &str);

    /// Tell the transport its configuration changed so it can persist itself
    fn notify_config_changed(&self, transport: &TransportId);
}
