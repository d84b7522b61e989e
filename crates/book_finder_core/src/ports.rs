//! crates/book_finder_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the concrete search API, HTTP client and chat platform.

use async_trait::async_trait;
use crate::domain::Reply;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, JSON).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Request timed out")]
    Timeout,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentSearchService: Send + Sync {
    /// Runs one search and returns the raw result records, unmapped.
    async fn search(&self, query: &str) -> PortResult<Vec<serde_json::Value>>;
}

/// What a completed availability probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The page did not answer within the probe timeout.
    TimedOut,
    /// The page answered; this is its (possibly truncated) body.
    Page(String),
}

#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    /// Fetches `url` with a short timeout. Timeouts are reported as
    /// `ProbeOutcome::TimedOut`, every other failure as an error.
    async fn probe(&self, url: &str) -> PortResult<ProbeOutcome>;
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Delivers one reply to a chat.
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> PortResult<()>;
}
