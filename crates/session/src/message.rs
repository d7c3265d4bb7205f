use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use uuid::Uuid;

use super::error::{InvalidMessageIdSnafu, SessionError, SessionResult};

/// Content of a bot entry while its reply is pending.
pub const PLACEHOLDER_CONTENT: &str = "...";
pub const TIMEOUT_REPLY: &str = "Response timed out. Please try again.";
pub const FAILURE_REPLY: &str = "Failed to get response. Click to retry.";

/// Stable identifier assigned to each message when it is created.
///
/// Pending replies are located by id, never by content, so two identical placeholders
/// resolve independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new_v7() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(raw: &str) -> SessionResult<Self> {
        let parsed = Uuid::parse_str(raw).context(InvalidMessageIdSnafu {
            stage: "parse-message-id",
            raw: raw.to_string(),
        })?;
        Ok(Self(parsed))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = SessionError;

    fn from_str(raw: &str) -> SessionResult<Self> {
        Self::parse(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Failed,
}

/// One entry of the chat log.
///
/// Serialized with the camelCase keys of the stored history blob. Every field except
/// `content` and `isBot` is optional on input so blobs from older clients still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default = "MessageId::new_v7")]
    pub id: MessageId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub retryable: bool,
    #[serde(default = "now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    /// Outbound user text a bot entry answers, resubmitted on retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new_v7(),
            content: content.into(),
            is_bot: false,
            loading: false,
            error: false,
            retryable: false,
            timestamp: now(),
            status: Some(MessageStatus::Sent),
            prompt: None,
        }
    }

    pub fn placeholder(prompt: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new_v7(),
            content: content.into(),
            is_bot: true,
            loading: true,
            error: false,
            retryable: false,
            timestamp: now(),
            status: None,
            prompt: Some(prompt.into()),
        }
    }

    /// Resolved form of the pending entry `id`.
    pub fn delivered(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            is_bot: true,
            loading: false,
            error: false,
            retryable: false,
            timestamp: now(),
            status: Some(MessageStatus::Delivered),
            prompt: None,
        }
    }

    /// Failed form of the pending entry `id`; keeps the prompt so it can be resent.
    pub fn failed(id: MessageId, content: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            is_bot: true,
            loading: false,
            error: true,
            retryable: true,
            timestamp: now(),
            status: Some(MessageStatus::Failed),
            prompt: Some(prompt.into()),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.loading
    }

    pub fn is_retryable(&self) -> bool {
        self.error && self.retryable
    }

    pub(crate) fn reset_for_retry(&mut self, placeholder: &str) {
        self.content = placeholder.to_string();
        self.loading = true;
        self.error = false;
        self.retryable = false;
        self.status = None;
        self.timestamp = now();
    }
}

/// Current time truncated to milliseconds, the precision kept in stored history.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
