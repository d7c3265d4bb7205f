use std::sync::{Arc, Mutex, PoisonError};

use chatline_llm::ChatApi;
use chatline_storage::KeyValueStore;
use snafu::{IntoError, ResultExt};
use tokio::sync::mpsc;

use crate::emoji::{ShortcodeDecorator, TextDecorator};
use crate::error::{
    ApiSnafu, ReadHistorySnafu, SendFailure, SessionResult, TimeoutSnafu, WriteHistorySnafu,
};
use crate::events::{EventBus, SessionEvent};
use crate::history;
use crate::message::{Message, MessageId};
use crate::settings::SessionSettings;
use crate::theme::Theme;
use crate::typing::TypingSignal;

/// Owns the chat log and drives the send / resolve / retry lifecycle.
///
/// The session is UI-agnostic: the reply source, the history store and the text
/// decorator are injected, and everything the presentation layer needs to react to is
/// published as [`SessionEvent`]s. Must be created inside a tokio runtime because the
/// typing debouncer runs as a background task.
pub struct MessageSession {
    log: Mutex<Vec<Message>>,
    /// Serializes snapshot-and-write so the last write always carries the newest log.
    persist: Mutex<()>,
    theme: Mutex<Theme>,
    typing: TypingSignal,
    events: EventBus,
    api: Arc<dyn ChatApi>,
    store: Arc<dyn KeyValueStore>,
    decorator: Arc<dyn TextDecorator>,
    settings: SessionSettings,
}

impl MessageSession {
    pub fn new(
        api: Arc<dyn ChatApi>,
        store: Arc<dyn KeyValueStore>,
        settings: SessionSettings,
    ) -> Self {
        let events = EventBus::new();
        let typing = TypingSignal::spawn(settings.typing_debounce(), events.clone());

        Self {
            log: Mutex::new(Vec::new()),
            persist: Mutex::new(()),
            theme: Mutex::new(Theme::default()),
            typing,
            events,
            api,
            store,
            decorator: Arc::new(ShortcodeDecorator),
            settings,
        }
    }

    pub fn with_theme(self, theme: Theme) -> Self {
        *self.theme.lock().unwrap_or_else(PoisonError::into_inner) = theme;
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the log in append order.
    pub fn messages(&self) -> Vec<Message> {
        self.with_log(|log| log.clone())
    }

    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.with_log(|log| log.iter().find(|message| message.id == id).cloned())
    }

    /// Most recent entry that `retry` would accept.
    pub fn last_retryable(&self) -> Option<MessageId> {
        self.with_log(|log| {
            log.iter()
                .rev()
                .find(|message| message.is_retryable())
                .map(|message| message.id)
        })
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_active()
    }

    pub fn theme(&self) -> Theme {
        *self.theme.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends one user message. Blank input is ignored; failures end up in the log.
    pub async fn send(&self, text: &str) {
        let prompt = text.trim();
        if prompt.is_empty() {
            tracing::debug!("ignoring blank message");
            return;
        }

        let placeholder = Message::placeholder(prompt, self.settings.placeholder.as_str());
        let placeholder_id = placeholder.id;
        self.append(Message::user(prompt));
        self.append(placeholder);

        self.resolve_pending(placeholder_id, prompt).await;
    }

    /// Resubmits the prompt behind a failed reply, reusing the same entry.
    ///
    /// No-op unless the entry exists and is retryable.
    pub async fn retry(&self, id: MessageId) {
        let placeholder = self.settings.placeholder.as_str();
        let prompt = self.with_log(|log| {
            let index = log.iter().position(|message| message.id == id)?;
            if !log[index].is_retryable() {
                return None;
            }

            // Entries restored from older histories carry no prompt; fall back to the
            // user message they answered.
            let prompt = log[index].prompt.clone().or_else(|| {
                log[..index]
                    .iter()
                    .rev()
                    .find(|message| !message.is_bot)
                    .map(|message| message.content.clone())
            })?;

            let entry = &mut log[index];
            entry.prompt = Some(prompt.clone());
            entry.reset_for_retry(placeholder);
            Some(prompt)
        });

        let Some(prompt) = prompt else {
            tracing::debug!(message_id = %id, "retry ignored, entry is missing or not retryable");
            return;
        };

        tracing::info!(message_id = %id, "retrying chat request");
        self.notify_log_changed();
        self.resolve_pending(id, &prompt).await;
    }

    /// Replaces the log with the stored history when one exists.
    ///
    /// Read or parse failures are logged and leave the current log untouched.
    pub fn load_history(&self) {
        match self.read_history() {
            Ok(Some(messages)) => {
                let count = messages.len();
                self.with_log(|log| *log = messages);
                tracing::info!(count, key = %self.settings.history_key, "restored chat history");
                self.notify_log_changed();
            }
            Ok(None) => {
                tracing::debug!(key = %self.settings.history_key, "no stored chat history");
            }
            Err(error) => {
                tracing::error!(
                    key = %self.settings.history_key,
                    error = %error,
                    "failed to restore chat history, keeping current log"
                );
            }
        }
    }

    /// Writes the full log to the store. Failures are logged, never returned.
    pub fn save_history(&self) {
        if let Err(error) = self.write_history() {
            tracing::error!(
                key = %self.settings.history_key,
                error = %error,
                "failed to persist chat history"
            );
        }
    }

    pub fn set_typing_signal(&self, active: bool) {
        self.typing.set(active);
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut current = self.theme.lock().unwrap_or_else(PoisonError::into_inner);
            *current = current.toggled();
            *current
        };
        tracing::debug!(theme = theme.name(), "theme toggled");
        self.events.emit(SessionEvent::ThemeChanged(theme));
        theme
    }

    pub fn render_text(&self, content: &str) -> String {
        self.decorator.decorate(content)
    }

    async fn resolve_pending(&self, placeholder_id: MessageId, prompt: &str) {
        self.set_typing_signal(true);

        let timeout = self.settings.request_timeout();
        let outcome = match tokio::time::timeout(timeout, self.api.send_message(prompt)).await {
            Ok(Ok(reply)) => Ok(reply.response),
            Ok(Err(source)) => Err(ApiSnafu {
                stage: "send-message",
            }
            .into_error(source)),
            Err(_) => TimeoutSnafu {
                stage: "send-message",
                timeout_ms: self.settings.request_timeout_ms,
            }
            .fail(),
        };

        let resolved = match outcome {
            Ok(response) => {
                tracing::debug!(message_id = %placeholder_id, "reply delivered");
                Message::delivered(placeholder_id, response)
            }
            Err(failure) => {
                log_failure(placeholder_id, &failure);
                Message::failed(placeholder_id, failure.user_message(), prompt)
            }
        };
        self.replace(resolved);

        self.set_typing_signal(false);
        self.save_history();
        self.events.emit(SessionEvent::FocusInput);
    }

    fn append(&self, message: Message) {
        self.with_log(|log| log.push(message));
        self.notify_log_changed();
    }

    fn replace(&self, message: Message) {
        let id = message.id;
        let replaced = self.with_log(|log| {
            log.iter_mut()
                .find(|entry| entry.id == id)
                .map(|entry| *entry = message)
                .is_some()
        });

        if replaced {
            self.notify_log_changed();
        } else {
            tracing::warn!(message_id = %id, "pending entry vanished before its reply arrived");
        }
    }

    fn notify_log_changed(&self) {
        self.events.emit(SessionEvent::LogChanged);
        self.events.emit(SessionEvent::ScrollToBottom);
    }

    fn read_history(&self) -> SessionResult<Option<Vec<Message>>> {
        let key = self.settings.history_key.as_str();
        let raw = self.store.get(key).context(ReadHistorySnafu {
            stage: "load-history-read",
            key,
        })?;
        raw.map(|raw| history::decode(&raw)).transpose()
    }

    fn write_history(&self) -> SessionResult<()> {
        let key = self.settings.history_key.as_str();
        let _persist = self.persist.lock().unwrap_or_else(PoisonError::into_inner);
        let raw = self.with_log(|log| history::encode(log))?;
        self.store.set(key, &raw).context(WriteHistorySnafu {
            stage: "save-history-write",
            key,
        })
    }

    fn with_log<R>(&self, op: impl FnOnce(&mut Vec<Message>) -> R) -> R {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut log)
    }
}

fn log_failure(placeholder_id: MessageId, failure: &SendFailure) {
    if failure.is_timeout() {
        tracing::warn!(message_id = %placeholder_id, error = %failure, "chat request timed out");
    } else {
        tracing::warn!(message_id = %placeholder_id, error = %failure, "chat request failed");
    }
}
