/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Retry,
    ToggleTheme,
    History,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "commands: /retry  /theme  /history  /help  /quit";

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        // A doubled slash escapes the command prefix.
        if let Some(escaped) = trimmed.strip_prefix("//") {
            return Self::Send(format!("/{escaped}"));
        }

        let Some(name) = trimmed.strip_prefix('/') else {
            return Self::Send(line.to_string());
        };

        match name.to_ascii_lowercase().as_str() {
            "retry" | "r" => Self::Retry,
            "theme" => Self::ToggleTheme,
            "history" => Self::History,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => Self::Unknown(name.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_sent_verbatim() {
        assert_eq!(Command::parse("  hi there "), Command::Send("  hi there ".to_string()));
        assert_eq!(Command::parse(""), Command::Send(String::new()));
    }

    #[test]
    fn slash_commands_are_recognized() {
        assert_eq!(Command::parse("/retry"), Command::Retry);
        assert_eq!(Command::parse(" /THEME "), Command::ToggleTheme);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/bogus"), Command::Unknown("bogus".to_string()));
    }

    #[test]
    fn doubled_slash_sends_literal_text() {
        assert_eq!(Command::parse("//theme"), Command::Send("/theme".to_string()));
    }
}
