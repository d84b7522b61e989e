//! services/bot/src/adapters/http_probe.rs
//!
//! This module contains the availability probe, a short-timeout GET of a
//! document page. It implements the `AvailabilityProbe` port from the `core` crate.

use async_trait::async_trait;
use book_finder_core::ports::{AvailabilityProbe, PortError, PortResult, ProbeOutcome};
use std::time::Duration;

/// Only the start of a page is needed to recognise the blocked placeholder.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `AvailabilityProbe` port with `reqwest`.
#[derive(Clone)]
pub struct HttpProbeAdapter {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbeAdapter {
    /// Creates a new `HttpProbeAdapter`. `timeout` covers the whole request,
    /// from connecting until the body has been read.
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        let mut response = self.client.get(url).timeout(self.timeout).send().await?;

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                let remaining = MAX_BODY_BYTES.saturating_sub(body.len());
                body.extend_from_slice(&chunk[..remaining]);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

//=========================================================================================
// `AvailabilityProbe` Trait Implementation
//=========================================================================================

#[async_trait]
impl AvailabilityProbe for HttpProbeAdapter {
    async fn probe(&self, url: &str) -> PortResult<ProbeOutcome> {
        match self.fetch(url).await {
            Ok(body) => Ok(ProbeOutcome::Page(body)),
            Err(e) if e.is_timeout() => Ok(ProbeOutcome::TimedOut),
            Err(e) => Err(PortError::Unexpected(format!("GET {} failed: {}", url, e))),
        }
    }
}
