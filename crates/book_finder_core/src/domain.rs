//! crates/book_finder_core/src/domain.rs
//!
//! Defines the core data structures for the application: search results,
//! requestable formats and the chat-facing message types.

use serde::Deserialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

//=========================================================================================
// Book
//=========================================================================================

/// A single document returned by the search API.
///
/// Identity is the `id` alone: two records with the same id but different
/// content are the same book.
#[derive(Debug, Clone, Deserialize)]
pub struct Book {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub size: u64,
    pub ext: String,
    pub url: String,
    pub date: i64,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default)]
    pub preview: Option<serde_json::Value>,
}

impl Book {
    /// The requestable format of this book, if its extension is one.
    pub fn extension(&self) -> Option<Extension> {
        self.ext.parse().ok()
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

//=========================================================================================
// Extension
//=========================================================================================

/// The closed set of formats a user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Mobi,
    Pdf,
    Fb2,
    Epub,
}

impl Extension {
    /// All formats, in the order they are offered to the user.
    pub const ALL: [Extension; 4] = [
        Extension::Mobi,
        Extension::Pdf,
        Extension::Fb2,
        Extension::Epub,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Extension::Mobi => "mobi",
            Extension::Pdf => "pdf",
            Extension::Fb2 => "fb2",
            Extension::Epub => "epub",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text does not name one of the requestable formats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a supported book format")]
pub struct UnknownExtension(pub String);

impl FromStr for Extension {
    type Err = UnknownExtension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Extension::ALL
            .into_iter()
            .find(|ext| ext.as_str() == s)
            .ok_or_else(|| UnknownExtension(s.to_string()))
    }
}

//=========================================================================================
// Chat Messages
//=========================================================================================

/// A text message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub text: String,
}

/// A clickable link to one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookLink {
    pub title: String,
    pub url: String,
}

impl From<&Book> for BookLink {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            url: book.url.clone(),
        }
    }
}

/// What the bot sends back. The transport decides how each variant is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text.
    Text(String),
    /// A one-time keyboard offering the requestable formats.
    FormatMenu {
        prompt: String,
        options: Vec<Extension>,
    },
    /// One inline button per book, opening its URL.
    BookLinks { header: String, links: Vec<BookLink> },
    /// The single answer for every failed or empty search.
    NoBooks,
}
