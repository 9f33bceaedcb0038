mod entry;
mod keys;

pub use entry::Entry;
pub use keys::{CallerKey, ChannelKey};
