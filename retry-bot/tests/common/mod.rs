//! Shared fixtures: bot identity, updates, scripted transport, attempt recorder, bot builder.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bot_api::{ApiError, ApiResult, Next, Request, RetryConfig, Transformer, Transport};
use bot_core::{Update, User};
use dispatcher::Dispatcher;
use retry_bot::{create_bot, BotConfig, BotOptions};
use serde_json::{json, Value};
use tokio::time::Instant;

pub const TEST_TOKEN: &str = "123456789:TEST_TOKEN";

/// Connection refused: fails immediately with a network error.
pub const UNREACHABLE_API_URL: &str = "http://127.0.0.1:1";

pub fn bot_info() -> User {
    serde_json::from_value(json!({
        "id": 123456789,
        "is_bot": true,
        "first_name": "TestBot",
        "username": "test_bot"
    }))
    .unwrap()
}

pub fn make_update(text: &str, update_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": 1, "is_bot": false, "first_name": "User"},
            "chat": {"id": 1, "type": "private", "first_name": "User"},
            "date": 1706529600,
            "text": text
        }
    }))
    .unwrap()
}

pub fn network_error(method: &str) -> ApiResult<Value> {
    Err(ApiError::network(method, "connection refused"))
}

/// `result` of a successful sendMessage / sendPhoto.
pub fn sent_message() -> ApiResult<Value> {
    Ok(json!({
        "message_id": 10,
        "date": 1706529600,
        "chat": {"id": 1, "type": "private"},
        "text": "ok"
    }))
}

/// Returns scripted results in order, then `fallback` forever.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ApiResult<Value>>>,
    fallback: ApiResult<Value>,
}

impl ScriptedTransport {
    pub fn always(result: ApiResult<Value>) -> Arc<Self> {
        Self::sequence(Vec::new(), result)
    }

    pub fn sequence(script: Vec<ApiResult<Value>>, fallback: ApiResult<Value>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _request: &Request) -> ApiResult<Value> {
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Counts every attempt that reaches it; installed after auto-retry.
#[derive(Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl CallRecorder {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl Transformer for CallRecorder {
    async fn call(&self, request: &Request, next: Next<'_>) -> ApiResult<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((request.method.clone(), Instant::now()));
        next.run(request).await
    }
}

pub fn retry_config(max_retry_attempts: u32) -> RetryConfig {
    RetryConfig::builder()
        .max_retry_attempts(max_retry_attempts)
        .max_delay_seconds(5)
        .build()
        .unwrap()
}

/// Bot with a scripted transport and a recorder after auto-retry.
pub fn create_test_bot(transport: Arc<dyn Transport>, retry: RetryConfig) -> (Dispatcher, CallRecorder) {
    let recorder = CallRecorder::default();
    let dispatcher = create_bot(
        &BotConfig::new(TEST_TOKEN),
        BotOptions {
            bot_info: Some(bot_info()),
            retry_config: Some(retry),
            transport: Some(transport),
            transformers: vec![Arc::new(recorder.clone())],
            ..BotOptions::default()
        },
    )
    .unwrap();
    (dispatcher, recorder)
}

/// Bot talking HTTP to `api_url` with millisecond backoff.
pub fn create_http_bot(api_url: &str, max_retry_attempts: u32) -> (Dispatcher, CallRecorder) {
    let mut config = BotConfig::new(TEST_TOKEN);
    config.api_url = api_url.to_string();
    config.request_timeout = Duration::from_secs(5);
    config.poll_timeout_secs = 0;
    let retry = RetryConfig::builder()
        .max_retry_attempts(max_retry_attempts)
        .max_delay_seconds(5)
        .initial_backoff(Duration::from_millis(10))
        .build()
        .unwrap();

    let recorder = CallRecorder::default();
    let dispatcher = create_bot(
        &config,
        BotOptions {
            bot_info: Some(bot_info()),
            retry_config: Some(retry),
            transformers: vec![Arc::new(recorder.clone())],
            ..BotOptions::default()
        },
    )
    .unwrap();
    (dispatcher, recorder)
}
