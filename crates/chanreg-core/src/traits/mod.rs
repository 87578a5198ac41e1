//! Interfaces the registry consumes
//!
//! - [`TransportOwner`]: transport → channel mapping
//! - [`SubscriptionOwner`]: subscription → channel binding
//! - [`ProgramGuideStore`], [`RecordingStore`], [`AutoRecordStore`]:
//!   channel-scoped data purged on delete
//! - [`PersistenceStore`]: durable per-channel records

pub mod persistence;
pub mod purge;
pub mod subscription;
pub mod transport;

pub use persistence::PersistenceStore;
pub use purge::{AutoRecordStore, ProgramGuideStore, RecordingStore};
pub use subscription::{SubscriptionId, SubscriptionOwner};
pub use transport::{TransportId, TransportOwner};
