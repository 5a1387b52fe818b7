//! # Application State
//!
//! Shared state handed to every handler: the winner service (which owns
//! the chain reader), the chat relay, and server configuration. Nothing
//! resolution-related is cached here; every request reads the chain.

use std::sync::Arc;

use circle_chain::{ConfigError, WinnerService};

use crate::chat::{ChatRelay, InMemoryMessageStore, MessageStore};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3001;

/// Default per-circle chat history cap.
pub const DEFAULT_CHAT_HISTORY_LIMIT: usize = 1000;

/// Default number of circles whose chat history is kept in memory.
pub const DEFAULT_CHAT_MAX_CIRCLES: usize = 10_000;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Messages kept per circle. `None` keeps everything.
    pub chat_history_limit: Option<usize>,
    /// Circles kept in the in-memory chat store. `None` keeps every circle.
    pub chat_max_circles: Option<usize>,
    /// Allowed CORS origin. `None` allows any origin.
    pub cors_allow_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            chat_history_limit: Some(DEFAULT_CHAT_HISTORY_LIMIT),
            chat_max_circles: Some(DEFAULT_CHAT_MAX_CIRCLES),
            cors_allow_origin: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 3001)
    /// - `CHAT_HISTORY_LIMIT` (default: 1000, `0` for unbounded)
    /// - `CHAT_MAX_CIRCLES` (default: 10000, `0` for unbounded)
    /// - `CORS_ALLOW_ORIGIN` (default: any origin)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = env_parse("PORT")?.unwrap_or(defaults.port);
        let chat_history_limit = env_cap("CHAT_HISTORY_LIMIT", defaults.chat_history_limit)?;
        let chat_max_circles = env_cap("CHAT_MAX_CIRCLES", defaults.chat_max_circles)?;
        let cors_allow_origin = std::env::var("CORS_ALLOW_ORIGIN")
            .ok()
            .filter(|v| !v.trim().is_empty() && v.trim() != "*");
        Ok(Self {
            port,
            chat_history_limit,
            chat_max_circles,
            cors_allow_origin,
        })
    }
}

/// A size cap where `0` means unbounded.
fn env_cap(var: &str, default: Option<usize>) -> Result<Option<usize>, ConfigError> {
    Ok(match env_parse::<usize>(var)? {
        Some(0) => None,
        Some(cap) => Some(cap),
        None => default,
    })
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                var: var.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

/// Shared application state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Resolution pipeline and status reads.
    pub winners: WinnerService,
    /// Chat history and broadcast hub.
    pub chat: ChatRelay,
    /// Server configuration.
    pub config: AppConfig,
}

impl AppState {
    /// State with default configuration and an in-memory chat store.
    pub fn new(winners: WinnerService) -> Self {
        Self::with_config(winners, AppConfig::default())
    }

    /// State with `config` and an in-memory chat store capped by it.
    pub fn with_config(winners: WinnerService, config: AppConfig) -> Self {
        let store = Arc::new(
            InMemoryMessageStore::new(config.chat_history_limit).with_max_circles(config.chat_max_circles),
        );
        Self::with_store(winners, store, config)
    }

    /// State over an injected chat store.
    pub fn with_store(winners: WinnerService, store: Arc<dyn MessageStore>, config: AppConfig) -> Self {
        Self {
            winners,
            chat: ChatRelay::new(store),
            config,
        }
    }
}
