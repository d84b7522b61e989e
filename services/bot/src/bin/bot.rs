//! services/bot/src/bin/bot.rs

use bot_lib::{
    adapters::{HttpProbeAdapter, TelegramAdapter, VkSearchAdapter},
    config::{Config, ConfigError, UpdateMode},
    dispatch::Dispatcher,
    error::BotError,
    web::{self, state::AppState},
};
use book_finder_core::{BookFinder, Conversation, FinderSettings, SessionStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), BotError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting bot...");

    // --- 2. Initialize Service Adapters ---
    let http_client = reqwest::Client::builder()
        .user_agent(concat!("book-finder-bot/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let search_adapter = Arc::new(VkSearchAdapter::new(
        http_client.clone(),
        config.vk_api_url.clone(),
        config.vk_access_token.clone(),
        config.vk_api_version.clone(),
        config.search_count,
    ));
    let probe_adapter = Arc::new(HttpProbeAdapter::new(
        http_client.clone(),
        config.probe_timeout,
    ));

    let telegram_token = config
        .telegram_token
        .clone()
        .ok_or_else(|| ConfigError::MissingVar("TG_BOT_TOKEN".to_string()))?;
    let telegram = Arc::new(TelegramAdapter::new(
        http_client,
        config.telegram_api_url.clone(),
        telegram_token,
    ));

    // --- 3. Build the Conversation ---
    let finder = BookFinder::new(
        search_adapter,
        probe_adapter,
        FinderSettings {
            result_limit: config.result_limit,
            probe_concurrency: config.probe_concurrency,
            probe_failure: config.probe_failure,
        },
    );
    let session_ttl = chrono::Duration::from_std(config.session_ttl)
        .map_err(|e| BotError::Internal(format!("Invalid session TTL: {}", e)))?;
    let conversation = Arc::new(Conversation::new(finder, SessionStore::new(session_ttl)));
    let dispatcher = Dispatcher::new(conversation, telegram.clone());

    // --- 4. Stop on Ctrl-C ---
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutdown requested.");
            shutdown.cancel();
        });
    }

    // --- 5. Receive Updates ---
    match config.update_mode {
        UpdateMode::Polling => {
            info!("Receiving updates by long polling.");
            telegram.delete_webhook().await?;
            let messages = telegram.poll_messages(config.poll_timeout, shutdown);
            dispatcher.run(messages).await;
        }
        UpdateMode::Webhook => {
            let webhook_url = config
                .webhook_url
                .as_deref()
                .ok_or_else(|| ConfigError::MissingVar("WEBHOOK_URL".to_string()))?;
            telegram
                .set_webhook(webhook_url, config.webhook_secret.as_deref())
                .await?;
            info!("Webhook registered at {}", webhook_url);

            let app_state = Arc::new(AppState {
                dispatcher: dispatcher.clone(),
                webhook_secret: config.webhook_secret.clone(),
            });
            let app = web::router(app_state);

            info!("Starting webhook server on {}", config.bind_address);
            let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await?;
            dispatcher.drain().await;
        }
    }

    info!("Bot stopped.");
    Ok(())
}
