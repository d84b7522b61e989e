//! In-memory fakes for the search and probe ports.

#![allow(dead_code)]

use async_trait::async_trait;
use book_finder_core::{
    AvailabilityProbe, BookFinder, DocumentSearchService, FinderSettings, PortError, PortResult,
    ProbeOutcome,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BLOCKED_BODY: &str =
    r#"<html><div class="message_page_body">This document is unavailable</div></html>"#;

pub fn record(id: i64, ext: &str, size: u64) -> Value {
    json!({
        "id": id,
        "owner_id": 100,
        "title": format!("Book {id}.{ext}"),
        "size": size,
        "ext": ext,
        "url": url_for(id),
        "date": 1_600_000_000,
        "type": 8
    })
}

pub fn url_for(id: i64) -> String {
    format!("https://vk.example/doc100_{id}")
}

/// Returns canned records, or fails when built with `failing`.
pub struct FakeSearch {
    records: Option<Vec<Value>>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn returning(records: Vec<Value>) -> Self {
        Self {
            records: Some(records),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            records: None,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentSearchService for FakeSearch {
    async fn search(&self, query: &str) -> PortResult<Vec<Value>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.records
            .clone()
            .ok_or_else(|| PortError::Unexpected("search API is down".to_string()))
    }
}

#[derive(Clone)]
pub enum FakeOutcome {
    Open,
    Blocked,
    TimedOut,
    Refused,
}

/// Answers probes from a per-URL table; unknown URLs are open pages.
#[derive(Default)]
pub struct FakeProbe {
    outcomes: HashMap<String, FakeOutcome>,
    pub probed: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn with(mut self, id: i64, outcome: FakeOutcome) -> Self {
        self.outcomes.insert(url_for(id), outcome);
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probed.lock().unwrap().len()
    }
}

#[async_trait]
impl AvailabilityProbe for FakeProbe {
    async fn probe(&self, url: &str) -> PortResult<ProbeOutcome> {
        self.probed.lock().unwrap().push(url.to_string());
        match self.outcomes.get(url).cloned().unwrap_or(FakeOutcome::Open) {
            FakeOutcome::Open => Ok(ProbeOutcome::Page("<html>%PDF</html>".to_string())),
            FakeOutcome::Blocked => Ok(ProbeOutcome::Page(BLOCKED_BODY.to_string())),
            FakeOutcome::TimedOut => Ok(ProbeOutcome::TimedOut),
            FakeOutcome::Refused => Err(PortError::Unexpected("connection refused".to_string())),
        }
    }
}

pub fn finder(
    search: Arc<FakeSearch>,
    probe: Arc<FakeProbe>,
    settings: FinderSettings,
) -> BookFinder {
    BookFinder::new(search, probe, settings)
}
