//! services/bot/src/web/state.rs
//!
//! Defines the state shared by the webhook handlers.

use crate::dispatch::Dispatcher;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Expected value of the `X-Telegram-Bot-Api-Secret-Token` header, if any.
    pub webhook_secret: Option<String>,
}
