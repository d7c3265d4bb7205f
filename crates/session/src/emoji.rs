/// Render-time text transformation. Never applied to stored content.
pub trait TextDecorator: Send + Sync {
    fn decorate(&self, text: &str) -> String;
}

/// Expands `:shortcode:` tokens (GitHub/gemoji names) into emoji glyphs.
///
/// Unknown shortcodes and stray colons are copied through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcodeDecorator;

impl TextDecorator for ShortcodeDecorator {
    fn decorate(&self, text: &str) -> String {
        let mut decorated = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(':') {
            decorated.push_str(&rest[..start]);
            let tail = &rest[start + 1..];

            let Some(end) = tail.find(':') else {
                decorated.push(':');
                rest = tail;
                break;
            };

            let candidate = &tail[..end];
            match lookup_shortcode(candidate) {
                Some(glyph) => {
                    decorated.push_str(glyph);
                    rest = &tail[end + 1..];
                }
                None => {
                    // The closing colon may open the next shortcode, so only consume one.
                    decorated.push(':');
                    rest = tail;
                }
            }
        }

        decorated.push_str(rest);
        decorated
    }
}

fn lookup_shortcode(candidate: &str) -> Option<&'static str> {
    let well_formed = !candidate.is_empty()
        && candidate
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '_' | '+' | '-'));
    if !well_formed {
        return None;
    }

    emojis::get_by_shortcode(candidate).map(|emoji| emoji.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shortcodes_become_glyphs() {
        let decorated = ShortcodeDecorator.decorate("ship it :rocket: :tada:");
        assert_eq!(decorated, "ship it 🚀 🎉");
    }

    #[test]
    fn unknown_shortcodes_and_times_are_left_alone() {
        let decorator = ShortcodeDecorator;
        assert_eq!(decorator.decorate("meet at 10:30"), "meet at 10:30");
        assert_eq!(
            decorator.decorate(":definitely_not_an_emoji:"),
            ":definitely_not_an_emoji:"
        );
        assert_eq!(decorator.decorate("trailing colon:"), "trailing colon:");
    }

    #[test]
    fn a_rejected_token_does_not_swallow_the_next_shortcode() {
        assert_eq!(ShortcodeDecorator.decorate("at 10:30 :rocket:"), "at 10:30 🚀");
        assert_eq!(ShortcodeDecorator.decorate("::rocket:"), ":🚀");
    }
}
