//! services/bot/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use book_finder_core::ProbeFailurePolicy;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How the bot receives updates from Telegram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    Polling,
    Webhook,
}

impl FromStr for UpdateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "polling" => Ok(Self::Polling),
            "webhook" => Ok(Self::Webhook),
            other => Err(format!("'{}' is not one of polling, webhook", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub telegram_token: Option<String>,
    pub telegram_api_url: String,
    pub vk_access_token: Option<String>,
    pub vk_api_url: String,
    pub vk_api_version: String,
    pub search_count: u32,
    pub probe_timeout: Duration,
    pub probe_concurrency: usize,
    pub probe_failure: ProbeFailurePolicy,
    pub result_limit: usize,
    pub session_ttl: Duration,
    pub update_mode: UpdateMode,
    pub poll_timeout: Duration,
    pub bind_address: SocketAddr,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Secrets (checked when first used) ---
        let telegram_token = lookup("TG_BOT_TOKEN");
        let vk_access_token = lookup("VK_ACCESS_TOKEN");

        // --- Remote APIs ---
        let telegram_api_url = lookup("TELEGRAM_API_URL")
            .unwrap_or_else(|| "https://api.telegram.org".to_string());
        let vk_api_url = lookup("VK_API_URL")
            .unwrap_or_else(|| "https://api.vk.com/method/docs.search".to_string());
        let vk_api_version = lookup("VK_API_VERSION").unwrap_or_else(|| "5.131".to_string());
        let search_count = parse_or(&lookup, "SEARCH_COUNT", 101u32)?;

        // --- Search Pipeline ---
        let probe_timeout = Duration::from_millis(parse_or(&lookup, "PROBE_TIMEOUT_MS", 500u64)?);
        let probe_concurrency = parse_or(&lookup, "PROBE_CONCURRENCY", 4usize)?;
        if probe_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "PROBE_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let probe_failure = parse_or(&lookup, "PROBE_FAILURE_POLICY", ProbeFailurePolicy::Exclude)?;
        let result_limit = parse_or(&lookup, "RESULT_LIMIT", 10usize)?;
        let session_ttl = Duration::from_secs(parse_or(&lookup, "SESSION_TTL_SECS", 600u64)?);

        // --- Update Delivery ---
        let update_mode = parse_or(&lookup, "UPDATE_MODE", UpdateMode::Polling)?;
        let poll_timeout = Duration::from_secs(parse_or(&lookup, "POLL_TIMEOUT_SECS", 30u64)?);
        let bind_address = parse_or(
            &lookup,
            "BIND_ADDRESS",
            SocketAddr::from(([0, 0, 0, 0], 3000)),
        )?;
        let webhook_url = lookup("WEBHOOK_URL");
        let webhook_secret = lookup("WEBHOOK_SECRET");

        if update_mode == UpdateMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::MissingVar("WEBHOOK_URL".to_string()));
        }

        Ok(Self {
            log_level,
            telegram_token,
            telegram_api_url,
            vk_access_token,
            vk_api_url,
            vk_api_version,
            search_count,
            probe_timeout,
            probe_concurrency,
            probe_failure,
            result_limit,
            session_ttl,
            update_mode,
            poll_timeout,
            bind_address,
            webhook_url,
            webhook_secret,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
