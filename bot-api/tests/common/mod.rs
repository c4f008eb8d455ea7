//! Test doubles: a transport that replays a script of results, and a transformer that records every attempt.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bot_api::{ApiResult, Next, Request, Transformer, Transport};
use serde_json::{json, Value};
use tokio::time::Instant;

/// Returns scripted results in order, then `fallback` forever.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ApiResult<Value>>>,
    fallback: ApiResult<Value>,
}

impl ScriptedTransport {
    pub fn always(result: ApiResult<Value>) -> Self {
        Self::sequence(Vec::new(), result)
    }

    pub fn sequence(script: Vec<ApiResult<Value>>, fallback: ApiResult<Value>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _request: &Request) -> ApiResult<Value> {
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// One attempt as seen at the transport boundary.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub attempt: u32,
    pub at: Instant,
}

/// Records every request passing through it.
#[derive(Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallRecorder {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }
}

#[async_trait]
impl Transformer for CallRecorder {
    async fn call(&self, request: &Request, next: Next<'_>) -> ApiResult<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.clone(),
            attempt: request.attempt,
            at: Instant::now(),
        });
        next.run(request).await
    }
}

/// `result` of a successful sendMessage.
pub fn sent_message(text: &str) -> Value {
    json!({
        "message_id": 10,
        "date": 1706529600,
        "chat": {"id": 1, "type": "private"},
        "text": text
    })
}
