//! # Configuration Module
//!
//! Runtime settings read from the environment (after loading `.env`).

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_MENU_PATH: &str = "./data/benugo.json";
pub const DEFAULT_CONVERSATION_TTL_SECS: u64 = 15 * 60;
pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the coffee bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// Telegram bot token
    pub bot_token: String,
    /// Postgres connection string
    pub database_url: String,
    /// Path of the menu JSON document
    pub menu_path: String,
    /// Idle time after which an unfinished coffee request is forgotten
    pub conversation_ttl: Duration,
    /// How often expired requests are pruned
    pub prune_interval: Duration,
    /// Upper bound for waiting on a database connection
    pub db_acquire_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            database_url: String::new(),
            menu_path: DEFAULT_MENU_PATH.to_string(),
            conversation_ttl: Duration::from_secs(DEFAULT_CONVERSATION_TTL_SECS),
            prune_interval: Duration::from_secs(DEFAULT_PRUNE_INTERVAL_SECS),
            db_acquire_timeout: Duration::from_secs(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS),
            log_format: LogFormat::Text,
        }
    }
}

impl BotConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bot_token = non_empty("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url = non_empty("DATABASE_URL").context("DATABASE_URL must be set")?;
        let menu_path = non_empty("MENU_PATH").unwrap_or(defaults.menu_path);

        let conversation_ttl = match non_empty("CONVERSATION_TTL_SECS") {
            Some(value) => parse_secs("CONVERSATION_TTL_SECS", &value)?,
            None => defaults.conversation_ttl,
        };
        let prune_interval = match non_empty("PRUNE_INTERVAL_SECS") {
            Some(value) => parse_secs("PRUNE_INTERVAL_SECS", &value)?,
            None => defaults.prune_interval,
        };
        let db_acquire_timeout = match non_empty("DB_ACQUIRE_TIMEOUT_SECS") {
            Some(value) => parse_secs("DB_ACQUIRE_TIMEOUT_SECS", &value)?,
            None => defaults.db_acquire_timeout,
        };

        let log_format = match non_empty("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be 'text' or 'json', got '{other}'"),
        };

        Ok(Self {
            bot_token,
            database_url,
            menu_path,
            conversation_ttl,
            prune_interval,
            db_acquire_timeout,
            log_format,
        })
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a number of seconds, got '{value}'"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
