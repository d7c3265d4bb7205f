use std::time::Duration;

use tokio::sync::watch;

use crate::events::{EventBus, SessionEvent};

pub const DEFAULT_TYPING_DEBOUNCE: Duration = Duration::from_millis(1_000);

/// Debounced, de-duplicated "bot is typing" indicator.
///
/// Raw updates restart a quiet-period timer; when it expires the latest raw value is
/// published only if it differs from the last published one. A start/stop pair that
/// lands inside one quiet period therefore never reaches the presentation layer.
#[derive(Debug)]
pub struct TypingSignal {
    input: watch::Sender<bool>,
    published: watch::Receiver<bool>,
}

impl TypingSignal {
    /// Spawns the debouncer on the current tokio runtime. It stops when the signal is dropped.
    pub fn spawn(debounce: Duration, events: EventBus) -> Self {
        let (input_tx, input_rx) = watch::channel(false);
        let (published_tx, published_rx) = watch::channel(false);
        tokio::spawn(run_debouncer(debounce, input_rx, published_tx, events));

        Self {
            input: input_tx,
            published: published_rx,
        }
    }

    pub fn set(&self, active: bool) {
        // send_replace marks the value changed even when equal, which restarts the timer.
        self.input.send_replace(active);
    }

    pub fn is_active(&self) -> bool {
        *self.published.borrow()
    }
}

async fn run_debouncer(
    debounce: Duration,
    mut input: watch::Receiver<bool>,
    published: watch::Sender<bool>,
    events: EventBus,
) {
    loop {
        if input.changed().await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(debounce) => break,
            }
        }

        let pending = *input.borrow_and_update();
        if pending != *published.borrow() {
            published.send_replace(pending);
            tracing::debug!(typing = pending, "typing indicator changed");
            events.emit(SessionEvent::TypingChanged(pending));
        }
    }
}
