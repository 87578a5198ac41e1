//! The channel entity and its persisted record

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::slug::slugify;

/// Stable handle for a channel
///
/// Assigned once at creation, unchanged by renames and never handed out
/// again after the channel is deleted. Collaborators keep this key rather
/// than any reference to the channel itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelTag(pub u32);

impl fmt::Display for ChannelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commercial detection mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommercialDetect {
    /// No detection
    #[default]
    None,
    /// Teletext page 192 based detection
    Ttp192,
}

impl CommercialDetect {
    /// Tag used in persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            CommercialDetect::None => "none",
            CommercialDetect::Ttp192 => "ttp192",
        }
    }
}

impl fmt::Display for CommercialDetect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named broadcast channel
///
/// Instances are owned by the registry. Everything handed to callers is a
/// snapshot clone; changes go through registry operations addressed by
/// [`ChannelTag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Legacy numeric identifier, never reused
    pub index: u32,
    /// Stable handle
    pub tag: ChannelTag,
    /// Unique display name
    pub name: String,
    /// Printable short form of `name`
    pub slug: String,
    /// Icon URL or path
    pub icon: Option<String>,
    /// Commercial detection mode
    pub commercial_detect: CommercialDetect,
}

impl Channel {
    pub(crate) fn new(index: u32, tag: ChannelTag, name: &str) -> Self {
        Self {
            index,
            tag,
            name: name.to_string(),
            slug: slugify(name),
            icon: None,
            commercial_detect: CommercialDetect::default(),
        }
    }

    /// Replace the name and regenerate the slug
    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.slug = slugify(name);
    }

    /// The record persisted for this channel
    pub fn record(&self) -> ChannelRecord {
        ChannelRecord {
            icon: self.icon.clone().unwrap_or_default(),
            commercial_detect: self.commercial_detect,
        }
    }

    /// Apply a persisted record to this channel
    pub(crate) fn apply_record(&mut self, record: &ChannelRecord) {
        self.icon = if record.icon.is_empty() {
            None
        } else {
            Some(record.icon.clone())
        };
        self.commercial_detect = record.commercial_detect;
    }
}

/// Durable per-channel document, keyed by the channel's current name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Icon URL or path, empty when the channel has none
    #[serde(default)]
    pub icon: String,
    /// Commercial detection mode
    #[serde(default)]
    pub commercial_detect: CommercialDetect,
}
