use chatline_llm::ApiError;
use chatline_storage::StorageError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("message id '{raw}' is not a valid uuid"))]
    InvalidMessageId {
        stage: &'static str,
        raw: String,
        source: uuid::Error,
    },
    #[snafu(display("failed to serialize chat history on `{stage}`: {source}"))]
    SerializeHistory {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to parse chat history on `{stage}`: {source}"))]
    ParseHistory {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to read chat history key '{key}': {source}"))]
    ReadHistory {
        stage: &'static str,
        key: String,
        source: StorageError,
    },
    #[snafu(display("failed to write chat history key '{key}': {source}"))]
    WriteHistory {
        stage: &'static str,
        key: String,
        source: StorageError,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Why a pending reply could not be delivered.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SendFailure {
    #[snafu(display("no response within {timeout_ms} ms"))]
    Timeout { stage: &'static str, timeout_ms: u64 },
    #[snafu(display("chat api request failed: {source}"))]
    Api {
        stage: &'static str,
        source: ApiError,
    },
}

impl SendFailure {
    /// Text shown in place of the reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => crate::message::TIMEOUT_REPLY,
            Self::Api { .. } => crate::message::FAILURE_REPLY,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
