//! Handler and error-sink traits.

use async_trait::async_trait;
use bot_core::{BotError, Update};
use tracing::error;

use crate::context::Context;

/// Handles one command. Implementations issue their outbound actions through `ctx`.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &Context) -> bot_core::Result<()>;
}

/// Receives errors that escaped a handler.
pub trait ErrorSink: Send + Sync {
    fn report(&self, update: &Update, error: &BotError);
}

/// Default sink: logs the error with the update's identifiers.
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, update: &Update, error: &BotError) {
        error!(
            update_id = update.update_id,
            chat_id = ?update.chat_id(),
            error = %error,
            "Handler failed"
        );
    }
}
