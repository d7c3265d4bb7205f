use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::theme::Theme;

/// Notification for the presentation layer.
///
/// Events are delivered in emission order, so a `ScrollToBottom` or `FocusInput`
/// always arrives after the `LogChanged` that caused it and can be handled once the
/// re-render is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LogChanged,
    ScrollToBottom,
    FocusInput,
    TypingChanged(bool),
    ThemeChanged(Theme),
}

/// Fan-out of session events to any number of subscribers.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event_tx);
        event_rx
    }

    pub fn emit(&self, event: SessionEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Receivers that were dropped are pruned on the next emit.
        subscribers.retain(|subscriber| subscriber.send(event).is_ok());
        tracing::trace!(?event, subscribers = subscribers.len(), "session event emitted");
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
