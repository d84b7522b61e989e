//! services/bot/src/web/webhook.rs
//!
//! Receives Telegram updates pushed to the webhook endpoint.

use crate::adapters::telegram::Update;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Accepts one update and handles it in the background.
///
/// Telegram only needs a quick 200; a search can take several seconds and its
/// reply is sent through the Bot API, not in this response.
pub async fn webhook_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(expected) = app_state.webhook_secret.as_deref() {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected) {
            warn!("Rejected webhook call with a wrong secret token.");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update_id = update.update_id;
    match update.into_incoming() {
        Some(message) => {
            app_state.dispatcher.spawn(message);
        }
        None => debug!("Update {} carries no text message", update_id),
    }
    StatusCode::OK
}
