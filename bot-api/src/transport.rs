//! Transport: sends one [`Request`] and turns the response envelope into a typed result or [`ApiError`].
//!
//! [`HttpTransport`] POSTs JSON to `{api_url}/bot{token}/{method}`. Tests substitute other [`Transport`]
//! implementations to inject failures.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bot_core::{ApiError, ApiResult, ResponseParameters};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::request::Request;

/// Default Bot API server.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Sends a single request attempt. No retries happen at this level.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the `result` field of an `ok: true` envelope.
    async fn send(&self, request: &Request) -> ApiResult<Value>;
}

/// Masks a bot token for logging: first 7 + `***` + last 4 chars; tokens of 11 chars or fewer become `***`.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let len = chars.len();
    if len <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[len - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

/// reqwest-based transport.
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_url", &self.api_url)
            .field("token", &mask_token(&self.token))
            .finish()
    }
}

impl HttpTransport {
    /// Creates a transport for `token`. `api_url` defaults to [`DEFAULT_API_URL`]; `timeout` bounds each attempt.
    pub fn new(
        token: impl Into<String>,
        api_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, token, api_url))
    }

    /// Creates a transport around an existing client.
    pub fn with_client(client: reqwest::Client, token: impl Into<String>, api_url: Option<&str>) -> Self {
        let api_url = api_url
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            client,
            api_url,
            token: token.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, attempt = request.attempt))]
    async fn send(&self, request: &Request) -> ApiResult<Value> {
        let response = self
            .client
            .post(self.method_url(&request.method))
            .json(&request.payload)
            .send()
            .await
            .map_err(|e| ApiError::network(&request.method, describe_reqwest_error(e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(&request.method, describe_reqwest_error(e)))?;

        debug!(status, body_len = body.len(), "Bot API response received");
        parse_envelope(&request.method, status, &body)
    }
}

/// Error text with its source chain; the request URL is stripped because it contains the token.
fn describe_reqwest_error(error: reqwest::Error) -> String {
    let error = error.without_url();
    let mut text = error.to_string();
    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

/// Parses a Bot API envelope. A non-JSON body with a 5xx status (e.g. from a gateway) is reported as a
/// server error so the retry policy can still act on it.
pub(crate) fn parse_envelope(method: &str, status: u16, body: &str) -> ApiResult<Value> {
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if envelope.ok => Ok(envelope.result.unwrap_or(Value::Null)),
        Ok(envelope) => Err(ApiError::Api {
            method: method.to_string(),
            error_code: envelope.error_code.unwrap_or(status),
            description: envelope
                .description
                .unwrap_or_else(|| format!("HTTP status {}", status)),
            parameters: envelope.parameters,
        }),
        Err(_) if status >= 500 => Err(ApiError::api(
            method,
            status,
            format!("HTTP status {} with a non-JSON body", status),
        )),
        Err(e) => Err(ApiError::InvalidResponse {
            method: method.to_string(),
            message: e.to_string(),
        }),
    }
}
