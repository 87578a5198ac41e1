//! Name-ordered channel index
//!
//! Holds every live channel keyed by its display name. Iteration follows
//! [`natural_cmp`](crate::natural::natural_cmp) order of the current names.

use std::collections::BTreeMap;

use crate::channel::Channel;
use crate::natural::NaturalKey;

/// Ordered, unique-keyed collection of channels
#[derive(Debug, Default)]
pub struct NameIndex {
    entries: BTreeMap<NaturalKey, Channel>,
}

impl NameIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match lookup by name
    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.entries.get(&NaturalKey::new(name))
    }

    /// Mutable exact-match lookup by name
    ///
    /// The returned entry must not have its `name` changed in place; remove
    /// and reinsert instead.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.entries.get_mut(&NaturalKey::new(name))
    }

    /// Whether a channel with this exact name exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&NaturalKey::new(name))
    }

    /// Insert a channel under its current name
    ///
    /// A channel whose name is already present is handed back untouched.
    pub fn insert(&mut self, channel: Channel) -> Result<(), Channel> {
        let key = NaturalKey::new(channel.name.as_str());
        if self.entries.contains_key(&key) {
            return Err(channel);
        }
        self.entries.insert(key, channel);
        Ok(())
    }

    /// Remove a channel by name
    pub fn remove(&mut self, name: &str) -> Option<Channel> {
        self.entries.remove(&NaturalKey::new(name))
    }

    /// Linear scan for the first channel matching `pred`
    pub fn find_by<P>(&self, mut pred: P) -> Option<&Channel>
    where
        P: FnMut(&Channel) -> bool,
    {
        self.entries.values().find(|&ch| pred(ch))
    }

    /// Channels in dictionary order
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.entries.values()
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
