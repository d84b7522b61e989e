//! crates/book_finder_core/src/command.rs
//!
//! Parses slash commands out of chat message text.

use regex::Regex;
use std::sync::OnceLock;

/// A slash command the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// `/search <text>`; the text is trimmed and may be empty.
    Search(String),
    /// Any other command name.
    Unknown(String),
}

fn command_regex() -> &'static Regex {
    static COMMAND: OnceLock<Regex> = OnceLock::new();
    // `/name`, optionally addressed as `/name@BotName`, followed by free text.
    COMMAND.get_or_init(|| {
        Regex::new(r"^/(?P<name>[A-Za-z0-9_]+)(?:@\S+)?(?:\s+(?P<args>[\s\S]*))?$")
            .expect("command pattern is valid")
    })
}

impl Command {
    /// Returns `None` when `text` is not a command at all.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = command_regex().captures(text.trim())?;
        let name = caps.name("name")?.as_str();
        let args = caps.name("args").map(|m| m.as_str().trim()).unwrap_or("");

        Some(match name {
            "start" => Command::Start,
            "search" => Command::Search(args.to_string()),
            other => Command::Unknown(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_with_text() {
        assert_eq!(
            Command::parse("/search war and peace tolstoy"),
            Some(Command::Search("war and peace tolstoy".to_string()))
        );
    }

    #[test]
    fn parses_commands_addressed_to_the_bot() {
        assert_eq!(
            Command::parse("/search@BookFinderBot  1984 orwell "),
            Some(Command::Search("1984 orwell".to_string()))
        );
        assert_eq!(Command::parse("/start@BookFinderBot"), Some(Command::Start));
    }

    #[test]
    fn search_without_text_has_empty_query() {
        assert_eq!(Command::parse("/search"), Some(Command::Search(String::new())));
        assert_eq!(Command::parse("/search   "), Some(Command::Search(String::new())));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("epub"), None);
        assert_eq!(Command::parse("search me"), None);
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            Command::parse("/help"),
            Some(Command::Unknown("help".to_string()))
        );
    }
}
