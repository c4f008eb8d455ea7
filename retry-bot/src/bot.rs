//! Builds the bot: API client with auto-retry, conversations and command routes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use bot_api::{ApiClient, AutoRetry, HttpTransport, RetryConfig, TraceRequests, Transformer, Transport};
use bot_core::User;
use conversations::{ConversationRuntime, ConversationStorage, MemoryStorage};
use dispatcher::Dispatcher;
use tracing::info;

use crate::config::BotConfig;
use crate::handlers::{
    ConversationSendMessage, ConversationSendPhoto, SendMessageCommand, SendPhotoCommand,
    CONVERSATION_SEND_MESSAGE, CONVERSATION_SEND_PHOTO, CONV_MESSAGE_COMMAND, CONV_PHOTO_COMMAND,
    SEND_MESSAGE_COMMAND, SEND_PHOTO_COMMAND,
};

/// Overrides for [`create_bot`]. Every field is optional.
#[derive(Default)]
pub struct BotOptions {
    /// Pre-fetched bot identity; its username is used to match `/cmd@botname`.
    pub bot_info: Option<User>,
    /// Replaces the retry policy derived from the config.
    pub retry_config: Option<RetryConfig>,
    /// Replaces the HTTP transport.
    pub transport: Option<Arc<dyn Transport>>,
    /// Installed after auto-retry, so they see every attempt.
    pub transformers: Vec<Arc<dyn Transformer>>,
    /// Conversation storage; in-memory by default.
    pub storage: Option<Arc<dyn ConversationStorage>>,
}

/// Creates the dispatcher with the four commands bound.
///
/// Every outbound call, from command handlers and conversations alike, goes through one [`ApiClient`]
/// whose outermost transformer is [`AutoRetry`].
pub fn create_bot(config: &BotConfig, options: BotOptions) -> Result<Dispatcher> {
    let retry_config = match options.retry_config {
        Some(retry_config) => retry_config,
        None => config.retry_config()?,
    };
    let transport: Arc<dyn Transport> = match options.transport {
        Some(transport) => transport,
        None => {
            // getUpdates holds the connection for up to the poll timeout.
            let timeout = config.request_timeout + Duration::from_secs(config.poll_timeout_secs.into());
            Arc::new(
                HttpTransport::new(&config.bot_token, Some(&config.api_url), timeout)
                    .context("Failed to build HTTP client")?,
            )
        }
    };

    info!(
        max_retry_attempts = retry_config.max_retry_attempts(),
        max_delay = ?retry_config.max_delay(),
        rethrow_http_errors = retry_config.rethrow_http_errors(),
        extra_transformers = options.transformers.len(),
        "Creating bot"
    );

    let mut api = ApiClient::new(transport)
        .with_transformer(Arc::new(AutoRetry::new(retry_config)))
        .with_transformer(Arc::new(TraceRequests));
    for transformer in options.transformers {
        api = api.with_transformer(transformer);
    }

    let storage = options
        .storage
        .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
    let runtime = ConversationRuntime::new(storage)
        .register(Arc::new(ConversationSendMessage))
        .register(Arc::new(ConversationSendPhoto));

    let mut dispatcher = Dispatcher::new(api, runtime)
        .command(SEND_MESSAGE_COMMAND, Arc::new(SendMessageCommand))
        .command(SEND_PHOTO_COMMAND, Arc::new(SendPhotoCommand))
        .conversation_command(CONV_MESSAGE_COMMAND, CONVERSATION_SEND_MESSAGE)
        .conversation_command(CONV_PHOTO_COMMAND, CONVERSATION_SEND_PHOTO);
    if let Some(username) = options.bot_info.and_then(|info| info.username) {
        dispatcher = dispatcher.with_bot_username(username);
    }
    Ok(dispatcher)
}
