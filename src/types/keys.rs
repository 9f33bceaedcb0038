use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for the channel (guild/room) that owns a queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey(pub String);

impl ChannelKey {
    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChannelKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ChannelKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Opaque identifier for the user issuing a command
///
/// Supplied by the chat layer; stable and unique per user per guild. This is
/// the uniqueness key inside a queue, distinct from the display tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerKey(pub String);

impl CallerKey {
    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CallerKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CallerKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
