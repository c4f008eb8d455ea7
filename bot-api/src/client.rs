//! [`ApiClient`]: transformer stack + transport, with typed Bot API methods.

use std::sync::Arc;

use bot_core::{ApiError, ApiResult, Message, Update, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::payloads::{GetUpdates, InputFile, SendMessage, SendPhoto};
use crate::request::Request;
use crate::transformer::{Next, Transformer};
use crate::transport::Transport;

/// Cheap to clone; clones share the transport and the transformer stack.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    transformers: Arc<Vec<Arc<dyn Transformer>>>,
}

impl ApiClient {
    /// Creates a client with no transformers.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            transformers: Arc::new(Vec::new()),
        }
    }

    /// Appends a transformer. Later transformers sit closer to the transport.
    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        Arc::make_mut(&mut self.transformers).push(transformer);
        self
    }

    /// Sends a raw call through the transformer stack; returns the envelope's `result`.
    #[instrument(skip(self, payload))]
    pub async fn call(&self, method: &str, payload: Value) -> ApiResult<Value> {
        let request = Request::new(method, payload);
        Next::new(self.transport.as_ref(), self.transformers.as_slice())
            .run(&request)
            .await
    }

    /// Serializes `payload`, calls `method` and deserializes the result into `R`.
    pub async fn call_typed<P, R>(&self, method: &str, payload: &P) -> ApiResult<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_value(payload).map_err(|e| ApiError::InvalidRequest {
            method: method.to_string(),
            message: e.to_string(),
        })?;
        let result = self.call(method, payload).await?;
        serde_json::from_value(result).map_err(|e| ApiError::InvalidResponse {
            method: method.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn get_me(&self) -> ApiResult<User> {
        self.call_typed("getMe", &serde_json::json!({})).await
    }

    pub async fn get_updates(&self, params: &GetUpdates) -> ApiResult<Vec<Update>> {
        self.call_typed("getUpdates", params).await
    }

    pub async fn send_message(&self, chat_id: i64, text: impl Into<String>) -> ApiResult<Message> {
        let payload = SendMessage {
            chat_id,
            text: text.into(),
            reply_to_message_id: None,
        };
        self.call_typed("sendMessage", &payload).await
    }

    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo: InputFile,
        caption: Option<String>,
    ) -> ApiResult<Message> {
        let payload = SendPhoto {
            chat_id,
            photo,
            caption,
        };
        self.call_typed("sendPhoto", &payload).await
    }
}
