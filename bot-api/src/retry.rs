//! Auto-retry transformer.
//!
//! Resubmits requests that failed with a retryable error:
//!
//! - **Transport failure** (no response): retried after the current backoff.
//! - **429**: retried after `retry_after` (capped at `max_delay`), or the current backoff if no hint was sent.
//! - **5xx**: retried after the current backoff unless `rethrow_internal_server_errors`.
//! - **Any other rejection**: returned immediately.
//!
//! With `rethrow_http_errors`, 5xx and other rejections are returned immediately; transport failures and 429
//! are still retried.
//! The backoff starts at `initial_backoff`, doubles after every use and is capped at `max_delay`.
//! After `max_retry_attempts` retries the last error is returned unchanged.

use std::time::Duration;

use async_trait::async_trait;
use bot_core::{ApiError, ApiResult, ErrorKind};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::request::Request;
use crate::transformer::{Next, Transformer};

const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(3);
/// Upper bound for `max_retry_attempts`.
pub const MAX_RETRY_ATTEMPTS_LIMIT: u32 = 100;
/// Upper bound for any single wait.
pub const ONE_HOUR: Duration = Duration::from_secs(3600);

/// Invalid retry configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RetryConfigError {
    #[error("max_retry_attempts must be at most 100, got {0}")]
    TooManyAttempts(u32),
    #[error("max_delay must be at most one hour, got {0:?}")]
    MaxDelayTooLong(Duration),
    #[error("initial_backoff must be at most one hour, got {0:?}")]
    BackoffTooLong(Duration),
}

/// Immutable retry policy. Build with [`RetryConfig::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    max_retry_attempts: u32,
    max_delay: Duration,
    initial_backoff: Duration,
    rethrow_http_errors: bool,
    rethrow_internal_server_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            max_delay: DEFAULT_MAX_DELAY,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            rethrow_http_errors: false,
            rethrow_internal_server_errors: false,
        }
    }
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder {
            config: Self::default(),
        }
    }

    /// Retries after the first attempt; total attempts are at most `max_retry_attempts + 1`.
    pub fn max_retry_attempts(&self) -> u32 {
        self.max_retry_attempts
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    pub fn rethrow_http_errors(&self) -> bool {
        self.rethrow_http_errors
    }

    pub fn rethrow_internal_server_errors(&self) -> bool {
        self.rethrow_internal_server_errors
    }
}

/// Builder for [`RetryConfig`]; unset fields keep their defaults.
#[derive(Debug, Clone)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.config.max_retry_attempts = attempts;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Shorthand for [`Self::max_delay`] in whole seconds.
    pub fn max_delay_seconds(self, seconds: u64) -> Self {
        self.max_delay(Duration::from_secs(seconds))
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.config.initial_backoff = backoff;
        self
    }

    pub fn rethrow_http_errors(mut self, rethrow: bool) -> Self {
        self.config.rethrow_http_errors = rethrow;
        self
    }

    pub fn rethrow_internal_server_errors(mut self, rethrow: bool) -> Self {
        self.config.rethrow_internal_server_errors = rethrow;
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryConfigError> {
        let config = self.config;
        if config.max_retry_attempts > MAX_RETRY_ATTEMPTS_LIMIT {
            return Err(RetryConfigError::TooManyAttempts(config.max_retry_attempts));
        }
        if config.max_delay > ONE_HOUR {
            return Err(RetryConfigError::MaxDelayTooLong(config.max_delay));
        }
        if config.initial_backoff > ONE_HOUR {
            return Err(RetryConfigError::BackoffTooLong(config.initial_backoff));
        }
        Ok(config)
    }
}

/// Per-request retry bookkeeping; lives for one logical request including all of its retries.
#[derive(Debug, Clone)]
pub struct RetryState {
    config: RetryConfig,
    attempts: u32,
    accumulated_delay: Duration,
    next_backoff: Duration,
}

impl RetryState {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            config: config.clone(),
            attempts: 0,
            accumulated_delay: Duration::ZERO,
            next_backoff: config.initial_backoff,
        }
    }

    /// Attempts submitted so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Total time spent waiting between attempts.
    pub fn accumulated_delay(&self) -> Duration {
        self.accumulated_delay
    }

    /// Records one submitted attempt.
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Decides whether `error` is retried; returns the wait before the next attempt.
    pub fn next_delay(&mut self, error: &ApiError) -> Option<Duration> {
        let retries_made = self.attempts.saturating_sub(1);
        if retries_made >= self.config.max_retry_attempts {
            return None;
        }
        let delay = match error.kind() {
            ErrorKind::Transport => self.backoff(),
            ErrorKind::ServerError | ErrorKind::Rejected if self.config.rethrow_http_errors => {
                return None
            }
            ErrorKind::RateLimited => match error.retry_after() {
                Some(hint) => {
                    self.next_backoff = self.config.initial_backoff;
                    hint.min(self.config.max_delay)
                }
                None => self.backoff(),
            },
            ErrorKind::ServerError if !self.config.rethrow_internal_server_errors => self.backoff(),
            ErrorKind::ServerError | ErrorKind::Rejected | ErrorKind::Malformed => return None,
        };
        self.accumulated_delay += delay;
        Some(delay)
    }

    fn backoff(&mut self) -> Duration {
        let delay = self.next_backoff.min(self.config.max_delay);
        self.next_backoff = (self.next_backoff * 2).min(ONE_HOUR);
        delay
    }
}

/// Transformer that resubmits failed requests per [`RetryConfig`]. Waits with `tokio::time::sleep`.
#[derive(Debug, Clone, Default)]
pub struct AutoRetry {
    config: RetryConfig,
}

impl AutoRetry {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl Transformer for AutoRetry {
    async fn call(&self, request: &Request, next: Next<'_>) -> ApiResult<Value> {
        let mut state = RetryState::new(&self.config);
        let mut request = request.clone();
        loop {
            state.record_attempt();
            let error = match next.run(&request).await {
                Ok(value) => {
                    if request.is_retry() {
                        info!(
                            method = %request.method,
                            attempts = state.attempts(),
                            waited_ms = state.accumulated_delay().as_millis() as u64,
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            let Some(delay) = state.next_delay(&error) else {
                if request.is_retry() {
                    warn!(
                        method = %request.method,
                        attempts = state.attempts(),
                        error = %error,
                        "Retries exhausted, giving up"
                    );
                }
                return Err(error);
            };

            warn!(
                method = %request.method,
                attempt = request.attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            request = request.next_attempt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(attempts: u32) -> RetryConfig {
        RetryConfig::builder()
            .max_retry_attempts(attempts)
            .max_delay_seconds(5)
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retry_attempts(), 3);
        assert_eq!(config.max_delay(), Duration::from_secs(5));
        assert_eq!(config.initial_backoff(), Duration::from_secs(3));
        assert!(!config.rethrow_http_errors());
        assert!(!config.rethrow_internal_server_errors());
    }

    #[test]
    fn test_builder_validates_ranges() {
        assert_eq!(
            RetryConfig::builder().max_retry_attempts(101).build(),
            Err(RetryConfigError::TooManyAttempts(101))
        );
        assert_eq!(
            RetryConfig::builder().max_delay_seconds(3601).build(),
            Err(RetryConfigError::MaxDelayTooLong(Duration::from_secs(3601)))
        );
        assert!(RetryConfig::builder()
            .initial_backoff(Duration::from_secs(7200))
            .build()
            .is_err());
        assert!(RetryConfig::builder().max_retry_attempts(0).build().is_ok());
    }

    /// **Test: Transport failures are retried until max_retry_attempts retries have been made.**
    #[test]
    fn test_transport_failures_exhaust_attempts() {
        let mut state = RetryState::new(&config(2));
        let err = ApiError::network("sendMessage", "connection refused");

        state.record_attempt();
        assert!(state.next_delay(&err).is_some());
        state.record_attempt();
        assert!(state.next_delay(&err).is_some());
        state.record_attempt();
        assert!(state.next_delay(&err).is_none());
        assert_eq!(state.attempts(), 3);
    }

    /// **Test: Backoff doubles per use and is capped at max_delay.**
    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig::builder()
            .max_retry_attempts(5)
            .max_delay_seconds(10)
            .initial_backoff(Duration::from_secs(3))
            .build()
            .unwrap();
        let mut state = RetryState::new(&config);
        let err = ApiError::network("getUpdates", "reset");

        let mut delays = Vec::new();
        for _ in 0..4 {
            state.record_attempt();
            delays.push(state.next_delay(&err).unwrap().as_secs());
        }

        assert_eq!(delays, vec![3, 6, 10, 10]);
        assert_eq!(state.accumulated_delay(), Duration::from_secs(29));
    }

    /// **Test: 429 waits for retry_after, capped at max_delay.**
    #[test]
    fn test_rate_limit_honors_hint() {
        let mut state = RetryState::new(&config(3));
        state.record_attempt();
        assert_eq!(
            state.next_delay(&ApiError::rate_limited("sendMessage", 2)),
            Some(Duration::from_secs(2))
        );
        state.record_attempt();
        assert_eq!(
            state.next_delay(&ApiError::rate_limited("sendMessage", 60)),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_rejections_are_not_retried() {
        let mut state = RetryState::new(&config(3));
        state.record_attempt();
        assert!(state
            .next_delay(&ApiError::api("sendMessage", 400, "Bad Request"))
            .is_none());
        let malformed = ApiError::InvalidResponse {
            method: "sendMessage".to_string(),
            message: "EOF".to_string(),
        };
        assert!(state.next_delay(&malformed).is_none());
    }

    /// **Test: rethrow_http_errors stops retries on rejections and 5xx but not on 429 or transport failures.**
    #[test]
    fn test_rethrow_http_errors() {
        let config = RetryConfig::builder()
            .max_retry_attempts(3)
            .rethrow_http_errors(true)
            .build()
            .unwrap();
        let mut state = RetryState::new(&config);
        state.record_attempt();

        assert_eq!(
            state.next_delay(&ApiError::rate_limited("sendMessage", 1)),
            Some(Duration::from_secs(1))
        );
        assert!(state.next_delay(&ApiError::api("sendMessage", 500, "Internal")).is_none());
        assert!(state.next_delay(&ApiError::api("sendMessage", 400, "Bad Request")).is_none());
        assert!(state.next_delay(&ApiError::network("sendMessage", "refused")).is_some());
    }

    #[test]
    fn test_rethrow_internal_server_errors() {
        let config = RetryConfig::builder()
            .rethrow_internal_server_errors(true)
            .build()
            .unwrap();
        let mut state = RetryState::new(&config);
        state.record_attempt();

        assert!(state.next_delay(&ApiError::api("sendMessage", 503, "Unavailable")).is_none());
        assert!(state.next_delay(&ApiError::rate_limited("sendMessage", 1)).is_some());
    }
}
