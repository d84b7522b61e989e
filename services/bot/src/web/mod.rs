pub mod state;
pub mod webhook;

use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use webhook::webhook_handler;

pub const WEBHOOK_PATH: &str = "/telegram/webhook";

/// Builds the router serving the webhook endpoint.
pub fn router(app_state: Arc<state::AppState>) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
