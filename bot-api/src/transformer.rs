//! Transformer chain around the transport.
//!
//! A [`Transformer`] receives the request and a [`Next`] handle to the rest of the chain. It may call
//! `next.run` zero, one or several times (retries), alter the request, or short-circuit.

use std::sync::Arc;

use async_trait::async_trait;
use bot_core::ApiResult;
use serde_json::Value;
use tracing::{debug, warn};

use crate::request::Request;
use crate::transport::Transport;

/// Intercepts outgoing requests.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn call(&self, request: &Request, next: Next<'_>) -> ApiResult<Value>;
}

/// The remaining transformers plus the transport. `Copy`, so a transformer can run it repeatedly.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    transport: &'a dyn Transport,
    rest: &'a [Arc<dyn Transformer>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(transport: &'a dyn Transport, rest: &'a [Arc<dyn Transformer>]) -> Self {
        Self { transport, rest }
    }

    /// Passes `request` to the next transformer, or to the transport when none is left.
    pub async fn run(self, request: &Request) -> ApiResult<Value> {
        match self.rest.split_first() {
            Some((head, tail)) => head.call(request, Next::new(self.transport, tail)).await,
            None => self.transport.send(request).await,
        }
    }
}

/// Logs every attempt that passes through it (method, attempt, outcome).
pub struct TraceRequests;

#[async_trait]
impl Transformer for TraceRequests {
    async fn call(&self, request: &Request, next: Next<'_>) -> ApiResult<Value> {
        debug!(method = %request.method, attempt = request.attempt, "Bot API request");
        let result = next.run(request).await;
        if let Err(e) = &result {
            warn!(
                method = %request.method,
                attempt = request.attempt,
                error = %e,
                "Bot API request failed"
            );
        }
        result
    }
}
