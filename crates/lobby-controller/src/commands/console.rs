/// One line of console input: `<channel> <author> <message>`.
///
/// The message keeps its inner whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleLine<'a> {
    pub channel: &'a str,
    pub author: &'a str,
    pub text: &'a str,
}

impl<'a> ConsoleLine<'a> {
    /// Split a line. Returns `None` when any of the three parts is missing.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let (channel, rest) = line.trim().split_once(char::is_whitespace)?;
        let (author, text) = rest.trim_start().split_once(char::is_whitespace)?;
        let text = text.trim();

        if text.is_empty() {
            return None;
        }

        Some(Self {
            channel,
            author,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_console_line() {
        assert_eq!(
            ConsoleLine::parse("customs_bot_commands alice !sign_up 1\n"),
            Some(ConsoleLine {
                channel: "customs_bot_commands",
                author: "alice",
                text: "!sign_up 1",
            })
        );
    }

    #[test]
    fn test_parse_console_line_collapses_separators() {
        assert_eq!(
            ConsoleLine::parse("general   bob   hello  there"),
            Some(ConsoleLine {
                channel: "general",
                author: "bob",
                text: "hello  there",
            })
        );
    }

    #[test]
    fn test_parse_console_line_incomplete() {
        assert_eq!(ConsoleLine::parse(""), None);
        assert_eq!(ConsoleLine::parse("general"), None);
        assert_eq!(ConsoleLine::parse("general bob"), None);
        assert_eq!(ConsoleLine::parse("general bob   "), None);
    }
}
