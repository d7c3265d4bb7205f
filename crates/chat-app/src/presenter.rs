use std::sync::Arc;

use chatline_session::{MessageSession, SessionEvent};
use snafu::ResultExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{AppResult, WriteOutputSnafu};
use crate::transcript::Transcript;

pub const PROMPT: &str = "> ";

/// Out-of-band output requested by the input loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Redraw,
}

/// Owns the terminal output and reacts to session events.
pub struct Presenter<W> {
    session: Arc<MessageSession>,
    transcript: Transcript,
    out: W,
}

impl<W: AsyncWrite + Unpin> Presenter<W> {
    pub fn new(session: Arc<MessageSession>, out: W) -> Self {
        Self {
            session,
            transcript: Transcript::new(),
            out,
        }
    }

    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        mut notices: mpsc::UnboundedReceiver<Notice>,
    ) -> AppResult<()> {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await?,
                    None => break,
                },
                notice = notices.recv() => match notice {
                    Some(notice) => self.handle_notice(notice).await?,
                    None => {
                        while let Ok(event) = events.try_recv() {
                            self.handle_event(event).await?;
                        }
                        break;
                    }
                },
            }
        }

        self.out.flush().await.context(WriteOutputSnafu {
            stage: "flush-on-exit",
        })
    }

    pub async fn handle_event(&mut self, event: SessionEvent) -> AppResult<()> {
        match event {
            SessionEvent::LogChanged => self.render_changes().await,
            SessionEvent::ScrollToBottom => self.out.flush().await.context(WriteOutputSnafu {
                stage: "scroll-to-bottom",
            }),
            SessionEvent::FocusInput => self.write(PROMPT).await,
            SessionEvent::TypingChanged(true) => self.write("  bot is typing...\n").await,
            SessionEvent::TypingChanged(false) => Ok(()),
            SessionEvent::ThemeChanged(theme) => {
                self.write(&format!("-- theme: {} --\n", theme.name()))
                    .await?;
                self.redraw().await
            }
        }
    }

    pub async fn handle_notice(&mut self, notice: Notice) -> AppResult<()> {
        match notice {
            Notice::Info(text) => self.write(&format!("{text}\n")).await,
            Notice::Redraw => self.redraw().await,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    async fn redraw(&mut self) -> AppResult<()> {
        self.transcript.reset();
        self.render_changes().await
    }

    async fn render_changes(&mut self) -> AppResult<()> {
        let session = Arc::clone(&self.session);
        let lines = self.transcript.update(&session.messages(), session.theme(), |text| {
            session.render_text(text)
        });

        for line in lines {
            self.write(&line).await?;
        }
        Ok(())
    }

    async fn write(&mut self, text: &str) -> AppResult<()> {
        self.out
            .write_all(text.as_bytes())
            .await
            .context(WriteOutputSnafu {
                stage: "write-terminal",
            })
    }
}
