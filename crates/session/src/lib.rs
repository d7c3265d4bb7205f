#![deny(unsafe_code)]

//! UI-agnostic chat session core: the message log, the send/retry lifecycle, history
//! persistence and the small presentation signals around them.

pub mod emoji;
pub mod error;
/// Events consumed by the presentation layer.
pub mod events;
pub mod history;
/// Message entities and their lifecycle constructors.
pub mod message;
pub mod session;
/// Settings persistence.
pub mod settings;
pub mod theme;
pub mod typing;

pub use emoji::{ShortcodeDecorator, TextDecorator};
pub use error::{SendFailure, SessionError, SessionResult};
pub use events::{EventBus, SessionEvent};
pub use history::HISTORY_KEY;
pub use message::{
    FAILURE_REPLY, Message, MessageId, MessageStatus, PLACEHOLDER_CONTENT, TIMEOUT_REPLY,
};
pub use session::MessageSession;
pub use settings::{
    AppSettings, ProviderSettings, SessionSettings, SettingsError, SettingsStore, StorageSettings,
};
pub use theme::Theme;
pub use typing::TypingSignal;
