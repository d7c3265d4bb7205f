use std::sync::Arc;

use chatline_session::{MessageSession, SettingsStore};
use chatline_storage::{KeyValueStore, open_store};
use snafu::ResultExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::command::{Command, HELP_TEXT};
use crate::error::{AppResult, OpenStoreSnafu, PresenterJoinSnafu, ReadInputSnafu};
use crate::presenter::{Notice, Presenter};
use crate::provider::build_chat_api;

/// Builds the session from the current settings: history store, chat provider and
/// the saved theme.
pub fn build_session(settings_store: &SettingsStore) -> AppResult<Arc<MessageSession>> {
    let settings = settings_store.settings();
    let store_path = settings
        .storage
        .resolved_path(&settings_store.config_dir());
    let store: Arc<dyn KeyValueStore> =
        open_store(settings.storage.backend, &store_path).context(OpenStoreSnafu {
            stage: "open-history-store",
            path: store_path.display().to_string(),
        })?;
    tracing::info!(
        backend = settings.storage.backend.name(),
        path = %store_path.display(),
        "history store opened"
    );

    let api = build_chat_api(&settings.provider);
    Ok(Arc::new(
        MessageSession::new(api, store, settings.session.clone()).with_theme(settings.theme),
    ))
}

/// Line-oriented chat front-end driving one [`MessageSession`].
pub struct ChatApp {
    session: Arc<MessageSession>,
    in_flight: JoinSet<()>,
}

impl ChatApp {
    pub fn new(session: Arc<MessageSession>) -> Self {
        Self {
            session,
            in_flight: JoinSet::new(),
        }
    }

    /// Reads commands until `/quit` or end of input, then waits for pending replies so
    /// they land in the saved history.
    pub async fn run<R, W>(mut self, input: R, output: W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let events = self.session.subscribe();
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let presenter = tokio::spawn(
            Presenter::new(Arc::clone(&self.session), output).run(events, notice_rx),
        );

        self.session.load_history();
        let _ = notices.send(Notice::Redraw);
        let _ = notices.send(Notice::Info(HELP_TEXT.to_string()));

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await.context(ReadInputSnafu {
            stage: "read-command",
        })? {
            match Command::parse(&line) {
                Command::Send(text) => {
                    let session = Arc::clone(&self.session);
                    self.in_flight.spawn(async move { session.send(&text).await });
                }
                Command::Retry => match self.session.last_retryable() {
                    Some(id) => {
                        let session = Arc::clone(&self.session);
                        self.in_flight.spawn(async move { session.retry(id).await });
                    }
                    None => {
                        let _ = notices.send(Notice::Info("nothing to retry".to_string()));
                    }
                },
                Command::ToggleTheme => {
                    self.session.toggle_theme();
                }
                Command::History => {
                    let _ = notices.send(Notice::Redraw);
                }
                Command::Help => {
                    let _ = notices.send(Notice::Info(HELP_TEXT.to_string()));
                }
                Command::Quit => break,
                Command::Unknown(name) => {
                    let _ = notices.send(Notice::Info(format!("unknown command /{name}")));
                }
            }
        }

        if !self.in_flight.is_empty() {
            tracing::info!(pending = self.in_flight.len(), "waiting for pending replies");
        }
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(error) = joined {
                tracing::warn!(error = %error, "chat request task failed");
            }
        }

        // The session keeps its event bus alive, so closing the notice channel is what
        // ends the presenter loop.
        drop(notices);
        presenter.await.context(PresenterJoinSnafu {
            stage: "join-presenter",
        })?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chatline_llm::{ApiError, ApiReply, ApiResult, BoxFuture, ChatApi};
    use chatline_session::{FAILURE_REPLY, HISTORY_KEY, MessageSession, SessionSettings};
    use chatline_session::{StorageSettings, Theme};
    use chatline_storage::{MemoryStore, StorageBackend};
    use tokio::io::{AsyncReadExt, duplex};

    use super::*;

    struct FirstTryFails {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl ChatApi for FirstTryFails {
        fn id(&self) -> &str {
            "first-try-fails"
        }

        fn send_message<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ApiResult<ApiReply>> {
            let call = self
                .calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::pin(async move {
                if call == 0 {
                    Err(ApiError::rejected("test", "down"))
                } else {
                    Ok(ApiReply::new(format!("re: {text}")))
                }
            })
        }
    }

    async fn run_script(script: &str, store: Arc<MemoryStore>) -> (Arc<MessageSession>, String) {
        let api = Arc::new(FirstTryFails {
            calls: Default::default(),
        });
        let session = Arc::new(MessageSession::new(api, store, SessionSettings::default()));
        let (writer, mut reader) = duplex(64 * 1024);

        ChatApp::new(Arc::clone(&session))
            .run(script.as_bytes(), writer)
            .await
            .expect("app run");

        let mut output = String::new();
        reader
            .read_to_string(&mut output)
            .await
            .expect("read output");
        (session, output)
    }

    #[tokio::test]
    async fn sends_then_retries_the_failed_reply() {
        let store = Arc::new(MemoryStore::new());
        let (session, output) = run_script("hello\n", Arc::clone(&store)).await;

        let failed = session.last_retryable().expect("first reply failed");
        assert!(output.contains(FAILURE_REPLY));

        session.retry(failed).await;
        let reply = session.message(failed).expect("entry kept");
        assert_eq!(reply.content, "re: hello");
        assert!(store.get(HISTORY_KEY).expect("read").is_some());
    }

    #[tokio::test]
    async fn quit_stops_reading_further_lines() {
        let store = Arc::new(MemoryStore::new());
        let (session, output) = run_script("/help\n/quit\nnever sent\n", store).await;

        assert!(session.messages().is_empty());
        assert!(output.contains(HELP_TEXT));
    }

    #[tokio::test]
    async fn unknown_commands_and_empty_retry_are_reported() {
        let store = Arc::new(MemoryStore::new());
        let (_, output) = run_script("/retry\n/bogus\n", store).await;

        assert!(output.contains("nothing to retry"));
        assert!(output.contains("unknown command /bogus"));
    }

    #[tokio::test]
    async fn build_session_applies_saved_theme_and_store() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let settings_store = SettingsStore::new(temp_dir.path().join("settings.json"));
        let mut settings = (*settings_store.settings()).clone();
        settings.theme = Theme::Dark;
        settings.storage = StorageSettings {
            backend: StorageBackend::Json,
            path: None,
        };
        settings_store.update(settings).expect("persist settings");

        let session = build_session(&settings_store).expect("session");
        assert_eq!(session.theme(), Theme::Dark);

        session.save_history();
        assert!(temp_dir.path().join("history.json").exists());
    }
}
