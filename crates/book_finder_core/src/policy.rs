//! crates/book_finder_core/src/policy.rs
//!
//! Format and size rules deciding which search results are worth offering.

use crate::domain::{Book, Extension};
use std::str::FromStr;

/// Documents of a size-gated format at or below this size are treated as stubs.
pub const SIZE_THRESHOLD_BYTES: u64 = 1_048_576;

/// Formats accepted regardless of size.
pub const LOW_SIZE_EXEMPT: [Extension; 2] = [Extension::Mobi, Extension::Epub];

/// Formats accepted only above `SIZE_THRESHOLD_BYTES`.
pub const SIZE_GATED: [Extension; 2] = [Extension::Pdf, Extension::Fb2];

/// Marker text of the placeholder page served for access-blocked documents.
pub const BLOCKED_PAGE_MARKER: &str = r#"class="message_page_body""#;

/// What to do with a candidate whose availability probe failed for a reason
/// other than a timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeFailurePolicy {
    /// Drop the candidate and keep going.
    #[default]
    Exclude,
    /// Keep the candidate, as if the probe had timed out.
    Include,
    /// Fail the whole search.
    Abort,
}

impl FromStr for ProbeFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exclude" => Ok(Self::Exclude),
            "include" => Ok(Self::Include),
            "abort" => Ok(Self::Abort),
            other => Err(format!(
                "'{other}' is not one of exclude, include, abort"
            )),
        }
    }
}

/// Whether `book` passes the format/size filter for a search in `requested`.
pub fn accepts(requested: Extension, book: &Book) -> bool {
    if book.ext != requested.as_str() {
        return false;
    }
    if LOW_SIZE_EXEMPT.contains(&requested) {
        return true;
    }
    SIZE_GATED.contains(&requested) && book.size > SIZE_THRESHOLD_BYTES
}

/// Whether a fetched page is the access-blocked placeholder.
pub fn is_blocked_page(body: &str) -> bool {
    body.contains(BLOCKED_PAGE_MARKER)
}
