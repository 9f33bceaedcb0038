use serde::{Deserialize, Serialize};

use crate::types::CallerKey;

/// One participant's record in a queue
///
/// `key` is the uniqueness key within a queue; `tag` is the caller-supplied
/// display name (BattleTag) used in replies. The redis backend stores the
/// serde encoding of this struct, one list element per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: CallerKey,
    pub tag: String,
}

impl Entry {
    pub fn new(key: impl Into<CallerKey>, tag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
        }
    }
}
