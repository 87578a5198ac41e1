//! Events emitted by the registry
//!
//! Delivered over a `tokio::sync::broadcast` channel. Delivery is
//! best-effort: with no receiver the event is discarded, and a receiver that
//! lags past the channel capacity skips the oldest events.

use crate::channel::ChannelTag;

/// A change to the set of channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// Channel created
    Created {
        tag: ChannelTag,
        name: String,
    },

    /// Channel renamed
    Renamed {
        tag: ChannelTag,
        old_name: String,
        new_name: String,
    },

    /// Icon or commercial detection mode changed
    Updated {
        tag: ChannelTag,
    },

    /// Transports of `source` moved to `destination` and `source` deleted;
    /// the matching `Deleted` follows
    Merged {
        destination: ChannelTag,
        source: ChannelTag,
        transports_moved: usize,
    },

    /// Channel deleted
    Deleted {
        tag: ChannelTag,
        name: String,
    },
}
