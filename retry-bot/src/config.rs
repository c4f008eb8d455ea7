//! Bot configuration loaded from the environment.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bot_api::{mask_token, RetryConfig, DEFAULT_API_URL};

const DEFAULT_LOG_FILE: &str = "logs/retry-bot.log";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_TIMEOUT_SECS: u32 = 30;

/// Connection, logging, polling and retry settings.
#[derive(Clone)]
pub struct BotConfig {
    /// TELEGRAM_BOT_TOKEN or BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL
    pub api_url: String,
    /// LOG_FILE
    pub log_file: String,
    /// REQUEST_TIMEOUT_SECS: bound on a single HTTP attempt
    pub request_timeout: Duration,
    /// POLL_TIMEOUT_SECS: server-side wait of getUpdates
    pub poll_timeout_secs: u32,
    /// MAX_RETRY_ATTEMPTS
    pub max_retry_attempts: Option<u32>,
    /// MAX_DELAY_SECONDS
    pub max_delay_seconds: Option<u64>,
    /// RETHROW_HTTP_ERRORS
    pub rethrow_http_errors: bool,
    /// RETHROW_INTERNAL_SERVER_ERRORS
    pub rethrow_internal_server_errors: bool,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &mask_token(&self.bot_token))
            .field("api_url", &self.api_url)
            .field("log_file", &self.log_file)
            .field("request_timeout", &self.request_timeout)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("max_retry_attempts", &self.max_retry_attempts)
            .field("max_delay_seconds", &self.max_delay_seconds)
            .field("rethrow_http_errors", &self.rethrow_http_errors)
            .field("rethrow_internal_server_errors", &self.rethrow_internal_server_errors)
            .finish()
    }
}

impl BotConfig {
    /// Creates a config for `token` with every other setting at its default.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot_token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            max_retry_attempts: None,
            max_delay_seconds: None,
            rethrow_http_errors: false,
            rethrow_internal_server_errors: false,
        }
    }

    /// Loads from environment variables. `token` overrides TELEGRAM_BOT_TOKEN / BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| non_empty_var("TELEGRAM_BOT_TOKEN"))
            .or_else(|| non_empty_var("BOT_TOKEN"));
        let Some(bot_token) = bot_token else {
            bail!("TELEGRAM_BOT_TOKEN environment variable is required (or pass --token)");
        };

        let defaults = Self::new(bot_token);
        Ok(Self {
            api_url: non_empty_var("TELEGRAM_API_URL").unwrap_or(defaults.api_url.clone()),
            log_file: non_empty_var("LOG_FILE").unwrap_or(defaults.log_file.clone()),
            request_timeout: parse_var::<u64>("REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            poll_timeout_secs: parse_var("POLL_TIMEOUT_SECS")?.unwrap_or(defaults.poll_timeout_secs),
            max_retry_attempts: parse_var("MAX_RETRY_ATTEMPTS")?,
            max_delay_seconds: parse_var("MAX_DELAY_SECONDS")?,
            rethrow_http_errors: flag_var("RETHROW_HTTP_ERRORS")?,
            rethrow_internal_server_errors: flag_var("RETHROW_INTERNAL_SERVER_ERRORS")?,
            ..defaults
        })
    }

    /// Validates the API URL and the retry settings.
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.api_url).is_err() {
            bail!("TELEGRAM_API_URL is set but not a valid URL: {}", self.api_url);
        }
        self.retry_config()?;
        Ok(())
    }

    /// Retry policy: defaults overridden by whatever was configured.
    pub fn retry_config(&self) -> Result<RetryConfig> {
        let mut builder = RetryConfig::builder()
            .rethrow_http_errors(self.rethrow_http_errors)
            .rethrow_internal_server_errors(self.rethrow_internal_server_errors);
        if let Some(attempts) = self.max_retry_attempts {
            builder = builder.max_retry_attempts(attempts);
        }
        if let Some(seconds) = self.max_delay_seconds {
            builder = builder.max_delay_seconds(seconds);
        }
        builder.build().context("Invalid retry configuration")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} is not a valid number: {}", name, raw)),
        None => Ok(None),
    }
}

fn flag_var(name: &str) -> Result<bool> {
    match non_empty_var(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => bail!("{} must be a boolean (true/false), got {}", name, v),
        },
    }
}
