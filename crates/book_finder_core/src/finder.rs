//! crates/book_finder_core/src/finder.rs
//!
//! The search pipeline: raw API records are mapped to books, filtered by format
//! and size, probed for availability, deduplicated by id and capped.
//! Every stage is a lazy stream, so candidates past the cap are never probed.

use crate::domain::{Book, Extension};
use crate::policy::{self, ProbeFailurePolicy};
use crate::ports::{AvailabilityProbe, DocumentSearchService, PortError, ProbeOutcome};
use futures::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Errors that end a search.
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error("Search service error: {0}")]
    Port(#[from] PortError),

    #[error("Malformed search record #{index}: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Availability probe for {url} failed: {source}")]
    Probe {
        url: String,
        #[source]
        source: PortError,
    },
}

/// Tunables for a `BookFinder`.
#[derive(Debug, Clone)]
pub struct FinderSettings {
    /// Maximum number of books returned per search.
    pub result_limit: usize,
    /// Number of availability probes allowed in flight at once.
    pub probe_concurrency: usize,
    pub probe_failure: ProbeFailurePolicy,
}

impl Default for FinderSettings {
    fn default() -> Self {
        Self {
            result_limit: 10,
            probe_concurrency: 4,
            probe_failure: ProbeFailurePolicy::Exclude,
        }
    }
}

/// Runs searches against a `DocumentSearchService` and filters the results.
#[derive(Clone)]
pub struct BookFinder {
    search: Arc<dyn DocumentSearchService>,
    probe: Arc<dyn AvailabilityProbe>,
    settings: FinderSettings,
}

impl BookFinder {
    pub fn new(
        search: Arc<dyn DocumentSearchService>,
        probe: Arc<dyn AvailabilityProbe>,
        settings: FinderSettings,
    ) -> Self {
        Self {
            search,
            probe,
            settings,
        }
    }

    /// Searches for `query` in format `ext`.
    ///
    /// Any failure is logged and reported as `None`; callers should treat `None`
    /// and an empty list the same way.
    pub async fn find(&self, query: &str, ext: Extension) -> Option<Vec<Book>> {
        match self.try_find(query, ext).await {
            Ok(books) => Some(books),
            Err(e) => {
                error!("Book search failed: {}", e);
                None
            }
        }
    }

    /// Searches for `query` in format `ext`, surfacing the first error.
    pub async fn try_find(&self, query: &str, ext: Extension) -> Result<Vec<Book>, FinderError> {
        let span = tracing::info_span!(
            "search",
            request_id = %Uuid::new_v4(),
            query = %query,
            ext = %ext
        );
        async move {
            let records = self.search.search(query).await?;
            info!("Search returned {} records", records.len());
            let books = self.filter_records(records, ext).await?;
            info!("Search produced {} books", books.len());
            Ok(books)
        }
        .instrument(span)
        .await
    }

    /// Runs the filtering stages over already-fetched records.
    pub async fn filter_records(
        &self,
        records: Vec<serde_json::Value>,
        ext: Extension,
    ) -> Result<Vec<Book>, FinderError> {
        let limit = self.settings.result_limit;
        if limit == 0 {
            return Ok(Vec::new());
        }

        // Each record is screened inside its own buffered future so that
        // errors surface in source order, whatever the concurrency.
        let candidates = stream::iter(records.into_iter().enumerate())
            .map(|record| self.screen(record, ext))
            .buffered(self.settings.probe_concurrency.max(1));
        futures::pin_mut!(candidates);

        let mut seen = HashSet::new();
        let mut books = Vec::new();
        while let Some(checked) = candidates.next().await {
            let Some(book) = checked? else {
                continue;
            };
            if seen.insert(book.id) {
                books.push(book);
                if books.len() >= limit {
                    break;
                }
            }
        }
        Ok(books)
    }

    /// Maps one raw record and runs it through the format filter and the probe.
    async fn screen(
        &self,
        record: (usize, serde_json::Value),
        ext: Extension,
    ) -> Result<Option<Book>, FinderError> {
        let book = map_record(record)?;
        if !policy::accepts(ext, &book) {
            return Ok(None);
        }
        self.check_availability(book).await
    }

    /// Probes one candidate and applies the accept/reject rules.
    async fn check_availability(&self, book: Book) -> Result<Option<Book>, FinderError> {
        match self.probe.probe(&book.url).await {
            Ok(ProbeOutcome::TimedOut) => {
                debug!(book_id = book.id, "Probe timed out, keeping book");
                Ok(Some(book))
            }
            Ok(ProbeOutcome::Page(body)) if policy::is_blocked_page(&body) => {
                debug!(book_id = book.id, "Book page is blocked, dropping");
                Ok(None)
            }
            Ok(ProbeOutcome::Page(_)) => Ok(Some(book)),
            Err(e) => match self.settings.probe_failure {
                ProbeFailurePolicy::Exclude => {
                    warn!(book_id = book.id, "Probe failed, dropping book: {}", e);
                    Ok(None)
                }
                ProbeFailurePolicy::Include => {
                    warn!(book_id = book.id, "Probe failed, keeping book: {}", e);
                    Ok(Some(book))
                }
                ProbeFailurePolicy::Abort => Err(FinderError::Probe {
                    url: book.url,
                    source: e,
                }),
            },
        }
    }
}

fn map_record((index, record): (usize, serde_json::Value)) -> Result<Book, FinderError> {
    serde_json::from_value(record).map_err(|source| FinderError::MalformedRecord { index, source })
}
