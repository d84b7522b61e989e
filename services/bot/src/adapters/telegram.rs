//! services/bot/src/adapters/telegram.rs
//!
//! This module contains the Telegram Bot API adapter. It implements the
//! `ChatTransport` port and exposes the update sources (long polling and
//! webhook registration) used by the dispatcher.

use async_trait::async_trait;
use book_finder_core::conversation::NO_BOOKS;
use book_finder_core::domain::{IncomingMessage, Reply};
use book_finder_core::ports::{ChatTransport, PortError, PortResult};
use futures::Stream;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Pause after a failed `getUpdates` call before polling again.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the Telegram Bot API over HTTPS.
#[derive(Clone)]
pub struct TelegramAdapter {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramAdapter {
    /// Creates a new `TelegramAdapter` for the bot identified by `token`.
    pub fn new(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Calls one Bot API method with a JSON body and unwraps the result envelope.
    async fn call<B, T>(&self, method: &str, body: &B, timeout: Option<Duration>) -> PortResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PortError::Timeout
            } else {
                PortError::Unexpected(format!("Telegram {} failed: {}", method, e.without_url()))
            }
        })?;

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            PortError::Unexpected(format!(
                "Telegram {} returned invalid JSON: {}",
                method,
                e.without_url()
            ))
        })?;
        envelope.into_result(method)
    }

    /// Fetches the next batch of updates, waiting up to `poll_timeout` for one.
    pub async fn get_updates(&self, offset: i64, poll_timeout: Duration) -> PortResult<Vec<Update>> {
        let body = GetUpdates {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        // The HTTP timeout must outlast the long poll itself.
        self.call("getUpdates", &body, Some(poll_timeout + Duration::from_secs(10)))
            .await
    }

    /// A stream of incoming text messages obtained by long polling.
    ///
    /// The stream ends when `shutdown` is cancelled.
    pub fn poll_messages(
        &self,
        poll_timeout: Duration,
        shutdown: CancellationToken,
    ) -> impl Stream<Item = IncomingMessage> + Send + 'static {
        let adapter = self.clone();
        async_stream::stream! {
            let mut offset = 0;
            loop {
                let batch = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    batch = adapter.get_updates(offset, poll_timeout) => batch,
                };
                match batch {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            if let Some(message) = update.into_incoming() {
                                yield message;
                            }
                        }
                    }
                    Err(PortError::Timeout) => debug!("getUpdates timed out, polling again"),
                    Err(e) => {
                        error!("Failed to fetch updates: {}", e);
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                        }
                    }
                }
            }
            info!("Update polling stopped.");
        }
    }

    /// Registers `url` as the webhook; Telegram stops serving `getUpdates` afterwards.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> PortResult<()> {
        let body = SetWebhook {
            url,
            secret_token: secret,
            allowed_updates: &["message"],
        };
        let _: bool = self.call("setWebhook", &body, None).await?;
        Ok(())
    }

    /// Removes any registered webhook so that long polling works.
    pub async fn delete_webhook(&self) -> PortResult<()> {
        let _: bool = self
            .call("deleteWebhook", &serde_json::json!({}), None)
            .await?;
        Ok(())
    }
}

//=========================================================================================
// `ChatTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatTransport for TelegramAdapter {
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> PortResult<()> {
        let body = render(chat_id, reply);
        let _: serde_json::Value = self.call("sendMessage", &body, None).await?;
        Ok(())
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> PortResult<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => {
                let description = self
                    .description
                    .unwrap_or_else(|| "no description".to_string());
                Err(match self.error_code {
                    Some(401) | Some(403) => PortError::Unauthorized,
                    Some(404) => PortError::NotFound(format!("{}: {}", method, description)),
                    _ => PortError::Unexpected(format!("Telegram {}: {}", method, description)),
                })
            }
        }
    }
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SetWebhook<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_token: Option<&'a str>,
    allowed_updates: &'a [&'a str],
}

/// One entry of a `getUpdates` result or a webhook delivery.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

impl Update {
    /// The text message carried by this update, if any.
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        let text = message.text?;
        let chat_id = message.chat.id;
        Some(IncomingMessage {
            chat_id,
            // Messages without a sender (channel posts) are keyed by chat.
            user_id: message.from.map(|user| user.id).unwrap_or(chat_id),
            text,
        })
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct SendMessage {
    chat_id: i64,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
enum ReplyMarkup {
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        one_time_keyboard: bool,
        resize_keyboard: bool,
    },
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
}

#[derive(Debug, Serialize, PartialEq)]
struct KeyboardButton {
    text: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct InlineKeyboardButton {
    text: String,
    url: String,
}

/// Renders a reply as a `sendMessage` request body.
pub(crate) fn render(chat_id: i64, reply: &Reply) -> SendMessage {
    let (text, reply_markup) = match reply {
        Reply::Text(text) => (text.clone(), None),
        Reply::NoBooks => (NO_BOOKS.to_string(), None),
        Reply::FormatMenu { prompt, options } => (
            prompt.clone(),
            Some(ReplyMarkup::Keyboard {
                keyboard: options
                    .iter()
                    .map(|ext| {
                        vec![KeyboardButton {
                            text: ext.to_string(),
                        }]
                    })
                    .collect(),
                one_time_keyboard: true,
                resize_keyboard: true,
            }),
        ),
        Reply::BookLinks { header, links } => (
            header.clone(),
            Some(ReplyMarkup::Inline {
                inline_keyboard: links
                    .iter()
                    .map(|link| {
                        // Telegram rejects buttons with empty labels.
                        let text = if link.title.trim().is_empty() {
                            link.url.clone()
                        } else {
                            link.title.clone()
                        };
                        vec![InlineKeyboardButton {
                            text,
                            url: link.url.clone(),
                        }]
                    })
                    .collect(),
            }),
        ),
    };

    SendMessage {
        chat_id,
        text,
        reply_markup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_finder_core::domain::{BookLink, Extension};
    use serde_json::json;

    #[test]
    fn format_menu_is_a_one_time_keyboard() {
        let reply = Reply::FormatMenu {
            prompt: "Choice book format".to_string(),
            options: Extension::ALL.to_vec(),
        };
        let body = serde_json::to_value(render(7, &reply)).unwrap();
        assert_eq!(
            body,
            json!({
                "chat_id": 7,
                "text": "Choice book format",
                "reply_markup": {
                    "keyboard": [
                        [{ "text": "mobi" }],
                        [{ "text": "pdf" }],
                        [{ "text": "fb2" }],
                        [{ "text": "epub" }]
                    ],
                    "one_time_keyboard": true,
                    "resize_keyboard": true
                }
            })
        );
    }

    #[test]
    fn book_links_become_url_buttons() {
        let reply = Reply::BookLinks {
            header: "Found".to_string(),
            links: vec![
                BookLink {
                    title: "Dune.epub".to_string(),
                    url: "https://vk.com/doc1_2".to_string(),
                },
                BookLink {
                    title: "  ".to_string(),
                    url: "https://vk.com/doc1_3".to_string(),
                },
            ],
        };
        let body = serde_json::to_value(render(7, &reply)).unwrap();
        assert_eq!(
            body["reply_markup"]["inline_keyboard"],
            json!([
                [{ "text": "Dune.epub", "url": "https://vk.com/doc1_2" }],
                [{ "text": "https://vk.com/doc1_3", "url": "https://vk.com/doc1_3" }]
            ])
        );
    }

    #[test]
    fn no_books_is_plain_text() {
        let body = serde_json::to_value(render(7, &Reply::NoBooks)).unwrap();
        assert_eq!(body, json!({ "chat_id": 7, "text": "No books were found" }));
    }

    #[test]
    fn update_without_text_is_skipped() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 1,
            "message": { "message_id": 3, "chat": { "id": 9 }, "from": { "id": 4 } }
        }))
        .unwrap();
        assert!(update.into_incoming().is_none());
    }

    #[test]
    fn update_maps_chat_and_sender() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 1,
            "message": {
                "message_id": 3,
                "chat": { "id": 9, "type": "private" },
                "from": { "id": 4, "is_bot": false },
                "text": "/start"
            }
        }))
        .unwrap();
        assert_eq!(
            update.into_incoming(),
            Some(IncomingMessage {
                chat_id: 9,
                user_id: 4,
                text: "/start".to_string(),
            })
        );
    }
}
