//! crates/book_finder_core/src/conversation.rs
//!
//! The two-step chat flow: `/search <text>` stores a pending query and offers
//! the formats, and the user's format choice runs the search and answers with
//! links.

use crate::command::Command;
use crate::domain::{BookLink, Extension, IncomingMessage, Reply};
use crate::finder::BookFinder;
use crate::session::{SessionKey, SessionStore};
use tracing::{debug, info};

pub const GREETING: &str =
    "Hello! To load book use /search <book_name author>. Example: /search war and peace tolstoy";
pub const FORMAT_PROMPT: &str = "Choice book format";
pub const RESULTS_HEADER: &str = "Here is what I found:";
pub const NO_BOOKS: &str = "No books were found";

/// Turns incoming chat messages into replies.
pub struct Conversation {
    finder: BookFinder,
    sessions: SessionStore,
}

impl Conversation {
    pub fn new(finder: BookFinder, sessions: SessionStore) -> Self {
        Self { finder, sessions }
    }

    /// Handles one message. `None` means the message is ignored.
    pub async fn handle(&self, message: &IncomingMessage) -> Option<Reply> {
        let key = SessionKey {
            chat_id: message.chat_id,
            user_id: message.user_id,
        };

        match Command::parse(&message.text) {
            Some(Command::Start) => Some(Reply::Text(GREETING.to_string())),
            Some(Command::Search(query)) if query.is_empty() => {
                Some(Reply::Text(GREETING.to_string()))
            }
            Some(Command::Search(query)) => {
                info!(chat_id = key.chat_id, "New search: {}", query);
                self.sessions.start(key, query).await;
                Some(format_menu())
            }
            Some(Command::Unknown(name)) => {
                debug!("Ignoring unknown command /{}", name);
                None
            }
            None => self.handle_format_choice(key, message.text.trim()).await,
        }
    }

    async fn handle_format_choice(&self, key: SessionKey, text: &str) -> Option<Reply> {
        // Plain text only matters while a search is waiting for its format.
        self.sessions.peek(key).await?;

        let ext = match text.parse::<Extension>() {
            Ok(ext) => ext,
            Err(e) => {
                debug!(chat_id = key.chat_id, "{}", e);
                return Some(format_menu());
            }
        };

        // The entry may have expired or been taken since the peek.
        let pending = self.sessions.take(key).await?;
        let books = self.finder.find(&pending.query, ext).await.unwrap_or_default();

        if books.is_empty() {
            return Some(Reply::NoBooks);
        }
        Some(Reply::BookLinks {
            header: RESULTS_HEADER.to_string(),
            links: books.iter().map(BookLink::from).collect(),
        })
    }
}

fn format_menu() -> Reply {
    Reply::FormatMenu {
        prompt: FORMAT_PROMPT.to_string(),
        options: Extension::ALL.to_vec(),
    }
}
