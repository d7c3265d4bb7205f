//! JSON codec for the persisted chat log.

use snafu::ResultExt;

use super::error::{ParseHistorySnafu, SerializeHistorySnafu, SessionResult};
use super::message::Message;

/// Storage key the log is written under.
pub const HISTORY_KEY: &str = "chatHistory";

pub fn encode(messages: &[Message]) -> SessionResult<String> {
    serde_json::to_string(messages).context(SerializeHistorySnafu {
        stage: "encode-history",
    })
}

pub fn decode(raw: &str) -> SessionResult<Vec<Message>> {
    serde_json::from_str(raw).context(ParseHistorySnafu {
        stage: "decode-history",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;
    use crate::message::{MessageStatus, PLACEHOLDER_CONTENT};

    #[test]
    fn encoded_history_uses_camel_case_keys_and_iso_timestamps() {
        let user = Message::user("hi");
        let raw = encode(std::slice::from_ref(&user)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &value[0];

        assert_eq!(entry["content"], "hi");
        assert_eq!(entry["isBot"], false);
        assert_eq!(entry["status"], "sent");
        assert!(entry.get("prompt").is_none());

        let timestamp = entry["timestamp"].as_str().unwrap();
        assert!(timestamp.starts_with(&user.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()));
    }

    #[test]
    fn decoding_restores_timestamps_to_the_millisecond() {
        let pending = Message::placeholder("hi", PLACEHOLDER_CONTENT);
        let messages = vec![
            Message::user("hi"),
            Message::delivered(pending.id, "hello"),
        ];

        let restored = decode(&encode(&messages).unwrap()).unwrap();
        assert_eq!(restored, messages);
    }

    #[test]
    fn legacy_entries_without_ids_or_timestamps_load() {
        let raw = r#"[
            {"content":"hi","isBot":false},
            {"content":"Failed to get response. Click to retry.","isBot":true,"error":true}
        ]"#;

        let restored = decode(raw).unwrap();
        assert_eq!(restored.len(), 2);
        assert_ne!(restored[0].id, restored[1].id);
        assert_eq!(restored[0].status, None);
        assert!(restored[1].error);
        assert!(!restored[1].retryable);
    }

    #[test]
    fn browser_style_timestamps_are_accepted() {
        let raw = r#"[{"content":"hello","isBot":true,"status":"delivered","timestamp":"2024-03-01T10:20:30.456Z"}]"#;

        let restored = decode(raw).unwrap();
        assert_eq!(restored[0].status, Some(MessageStatus::Delivered));
        assert_eq!(restored[0].timestamp.timestamp_millis(), 1_709_288_430_456);
    }

    #[test]
    fn corrupt_blob_is_a_parse_error() {
        let error = decode("{not json").unwrap_err();
        assert!(matches!(error, SessionError::ParseHistory { .. }));
    }
}
