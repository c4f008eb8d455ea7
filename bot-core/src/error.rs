//! Error types for the bot.
//!
//! [`ApiError`] is what a single Bot API call ends with; [`ErrorKind`] classifies it for the retry policy.
//! [`BotError`] is the top-level error returned by handlers and the dispatcher.

use std::time::Duration;

use thiserror::Error;

use crate::types::ResponseParameters;

/// Outcome of a failed Bot API call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was received (connection refused, DNS failure, timeout, reset).
    #[error("Network request for '{method}' failed: {message}")]
    Network { method: String, message: String },

    /// The platform answered with `ok: false`.
    #[error("Call to '{method}' failed! ({error_code}: {description})")]
    Api {
        method: String,
        error_code: u16,
        description: String,
        parameters: Option<ResponseParameters>,
    },

    /// A response arrived but is not a valid Bot API envelope.
    #[error("Invalid response for '{method}': {message}")]
    InvalidResponse { method: String, message: String },

    /// The payload could not be serialized; nothing was sent.
    #[error("Invalid request for '{method}', not sent: {message}")]
    InvalidRequest { method: String, message: String },
}

/// Retry-relevant classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response received.
    Transport,
    /// `error_code == 429`.
    RateLimited,
    /// `error_code >= 500`.
    ServerError,
    /// Any other `ok: false` response.
    Rejected,
    /// Unparseable response, or a request that could not be built.
    Malformed,
}

impl ApiError {
    pub fn network(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Builds an `ok: false` error without parameters.
    pub fn api(method: impl Into<String>, error_code: u16, description: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            error_code,
            description: description.into(),
            parameters: None,
        }
    }

    /// Builds a 429 error carrying `parameters.retry_after`.
    pub fn rate_limited(method: impl Into<String>, retry_after: u64) -> Self {
        Self::Api {
            method: method.into(),
            error_code: 429,
            description: format!("Too Many Requests: retry after {}", retry_after),
            parameters: Some(ResponseParameters {
                retry_after: Some(retry_after),
                migrate_to_chat_id: None,
            }),
        }
    }

    pub fn method(&self) -> &str {
        match self {
            Self::Network { method, .. }
            | Self::Api { method, .. }
            | Self::InvalidResponse { method, .. }
            | Self::InvalidRequest { method, .. } => method,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Transport,
            Self::Api { error_code: 429, .. } => ErrorKind::RateLimited,
            Self::Api { error_code, .. } if *error_code >= 500 => ErrorKind::ServerError,
            Self::Api { .. } => ErrorKind::Rejected,
            Self::InvalidResponse { .. } | Self::InvalidRequest { .. } => ErrorKind::Malformed,
        }
    }

    /// `error_code` of an `ok: false` response.
    pub fn error_code(&self) -> Option<u16> {
        match self {
            Self::Api { error_code, .. } => Some(*error_code),
            _ => None,
        }
    }

    /// Server-provided backoff hint (`parameters.retry_after`).
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api {
                parameters: Some(p),
                ..
            } => p.retry_after.map(Duration::from_secs),
            _ => None,
        }
    }
}

/// Errors from the conversation shim (routing, replay).
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Unknown conversation: {0}")]
    Unknown(String),

    #[error("Update {0} has no chat; conversations are keyed by chat")]
    NoChat(i64),

    #[error("Failed to record or replay external action '{label}' at step {step}: {source}")]
    Replay {
        step: usize,
        label: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error for handlers and dispatch.
#[derive(Error, Debug)]
pub enum BotError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    #[error("Handler error: {0}")]
    Handler(String),
}

impl BotError {
    /// The terminal API error, if this error came from a Bot API call.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of a single Bot API call.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Result type for handlers and dispatch; uses [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;
