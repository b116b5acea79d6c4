use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default field separator.
pub const DEFAULT_SEPARATOR: &str = "\t";

/// Settings shared by the sync and async channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelOptions {
    /// Literal substring used to split and join fields.
    pub separator: String,
    /// When set, handles take an advisory lock on open, waiting at most this
    /// long. `None` disables locking. Handles of the same channel on the same
    /// file share one lock, so re-opening never contends with the channel
    /// itself.
    pub lock_timeout: Option<Duration>,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            lock_timeout: None,
        }
    }
}

impl ChannelOptions {
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}
