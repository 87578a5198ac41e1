// # Subscription Owner Trait
//
// Active stream consumers may be bound to a channel. Subscriptions outlive
// their channel: when a channel goes away the registry only clears the
// binding.

use crate::channel::ChannelTag;

/// Identifier of an active subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Owner of subscription → channel bindings
///
/// Called under the registry's exclusive lock; must not call back into the
/// registry.
pub trait SubscriptionOwner: Send + Sync {
    /// Subscriptions currently bound to `channel`
    fn subscriptions_of(&self, channel: ChannelTag) -> Vec<SubscriptionId>;

    /// Clear the subscription's channel reference without destroying it
    fn unbind(&self, subscription: SubscriptionId);
}
