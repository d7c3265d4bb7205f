use std::collections::HashMap;

use chatline_session::{Message, MessageId, Theme};

const RESET: &str = "\x1b[0m";
const ERROR_COLOR: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";

/// Terminal rendering of the chat log.
///
/// A terminal cannot repaint rows in place, so the transcript remembers what it last
/// printed per message and only emits rows that are new or whose rendering changed.
#[derive(Debug, Default)]
pub struct Transcript {
    rendered: HashMap<MessageId, String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything printed so far; the next update prints the full log.
    pub fn reset(&mut self) {
        self.rendered.clear();
    }

    pub fn update(
        &mut self,
        messages: &[Message],
        theme: Theme,
        decorate: impl Fn(&str) -> String,
    ) -> Vec<String> {
        let mut lines = Vec::new();

        for message in messages {
            let line = format_message(message, theme, &decorate);
            let previous = self.rendered.insert(message.id, line.clone());
            if previous.as_deref() != Some(line.as_str()) {
                lines.push(line);
            }
        }

        lines
    }
}

pub fn format_message(message: &Message, theme: Theme, decorate: impl Fn(&str) -> String) -> String {
    let time = message.timestamp.format("%H:%M:%S");
    let (label, color) = speaker_style(message.is_bot, theme);

    if message.loading {
        return format!("{DIM}[{time}]{RESET} {color}{label}{RESET} {DIM}{}{RESET}\n", message.content);
    }

    if message.error {
        let hint = if message.is_retryable() { "  (/retry)" } else { "" };
        return format!(
            "{DIM}[{time}]{RESET} {color}{label}{RESET} {ERROR_COLOR}{}{RESET}{hint}\n",
            message.content
        );
    }

    format!(
        "{DIM}[{time}]{RESET} {color}{label}{RESET} {}\n",
        decorate(&message.content)
    )
}

fn speaker_style(is_bot: bool, theme: Theme) -> (&'static str, &'static str) {
    match (is_bot, theme) {
        (true, Theme::Light) => ("bot", "\x1b[34m"),
        (true, Theme::Dark) => ("bot", "\x1b[96m"),
        (false, Theme::Light) => ("you", "\x1b[32m"),
        (false, Theme::Dark) => ("you", "\x1b[92m"),
    }
}
