//! services/bot/src/adapters/vk_search.rs
//!
//! This module contains the adapter for the VK `docs.search` method.
//! It implements the `DocumentSearchService` port from the `core` crate.

use async_trait::async_trait;
use book_finder_core::ports::{DocumentSearchService, PortError, PortResult};
use serde::Deserialize;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `DocumentSearchService` port over the VK API.
#[derive(Clone)]
pub struct VkSearchAdapter {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
    version: String,
    count: u32,
}

impl VkSearchAdapter {
    /// Creates a new `VkSearchAdapter`. A missing token is sent as an empty string
    /// and surfaces as an API error on the first search.
    pub fn new(
        client: reqwest::Client,
        api_url: String,
        access_token: Option<String>,
        version: String,
        count: u32,
    ) -> Self {
        Self {
            client,
            api_url,
            access_token: access_token.unwrap_or_default(),
            version,
            count,
        }
    }
}

//=========================================================================================
// Response Envelope
//=========================================================================================

#[derive(Deserialize)]
struct SearchEnvelope {
    response: Option<SearchResponse>,
    error: Option<VkApiError>,
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct VkApiError {
    error_code: i64,
    error_msg: String,
}

impl SearchEnvelope {
    fn into_items(self) -> PortResult<Vec<serde_json::Value>> {
        if let Some(err) = self.error {
            // Codes 5 (authorization failed) and 15 (access denied) are token problems.
            return Err(match err.error_code {
                5 | 15 => PortError::Unauthorized,
                code => PortError::Unexpected(format!("VK API error {}: {}", code, err.error_msg)),
            });
        }
        self.response
            .map(|response| response.items)
            .ok_or_else(|| PortError::Unexpected("VK response has no items".to_string()))
    }
}

//=========================================================================================
// `DocumentSearchService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentSearchService for VkSearchAdapter {
    async fn search(&self, query: &str) -> PortResult<Vec<serde_json::Value>> {
        let count = self.count.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("count", count.as_str()),
                ("access_token", self.access_token.as_str()),
                ("v", self.version.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("VK request failed: {}", e)))?;

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("VK response is not valid JSON: {}", e)))?;

        let items = envelope.into_items()?;
        debug!("VK returned {} items for '{}'", items.len(), query);
        Ok(items)
    }
}
