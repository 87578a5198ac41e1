// # chanreg-core
//
// Core library for the broadcast channel registry.
//
// ## Architecture Overview
//
// - **natural**: dictionary ordering of names ("Channel 2" before "Channel 10")
// - **slug**: printable short names derived from display names
// - **index**: name-ordered, unique-keyed channel collection
// - **ChannelRegistry**: owns every channel; create/find/rename/merge/delete
// - **traits**: transport, subscription, program-guide, recording,
//   auto-record and persistence interfaces the registry consumes
// - **store**: file and memory persistence stores
//
// ## Design Principles
//
// 1. **Single owner**: only the registry holds channels; other subsystems
//    keep a `ChannelTag`
// 2. **Explicit instance**: no process-wide registry, construct one and share it
// 3. **Conflict before insert**: name collisions are rejected before any
//    mutation; a collision past that check is a fatal inconsistency
// 4. **Fire-and-forget persistence**: store failures are logged, never rolled back

pub mod channel;
pub mod config;
pub mod error;
pub mod index;
pub mod natural;
pub mod registry;
pub mod slug;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use channel::{Channel, ChannelRecord, ChannelTag, CommercialDetect};
pub use config::{RegistryConfig, StoreConfig};
pub use error::{Error, Result};
pub use registry::{ChannelRegistry, Collaborators, RegistryEvent};
pub use store::{FileStore, MemoryStore};
pub use traits::{
    AutoRecordStore, PersistenceStore, ProgramGuideStore, RecordingStore, SubscriptionOwner,
    TransportOwner,
};
