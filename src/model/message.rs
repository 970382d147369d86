//! A single archived chat message.

use serde::{Deserialize, Serialize};

/// One decoded entry from a channel-day file.
///
/// Only the fields the search engine reads are typed; every other key is
/// kept in `extra` so the full record can be handed back with a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Identifier of the human sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Identifier of the integration that posted the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,

    /// Display name chosen by a bot for this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Message body, with user references still in raw identifier form.
    #[serde(default)]
    pub text: String,

    /// Epoch timestamp string; doubles as the message id within a channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,

    /// Timestamp of the thread parent, present on threaded messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MessageRecord {
    /// Whether the message belongs to a thread (parent or reply).
    pub fn is_threaded(&self) -> bool {
        self.thread_ts.as_deref().is_some_and(|ts| !ts.is_empty())
    }
}
