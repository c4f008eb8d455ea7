//! [`Context`]: the update being handled plus the API client, with reply helpers.

use bot_api::{ApiClient, InputFile};
use bot_core::{BotError, Message, Result, Update};

use crate::command::Command;

/// Passed to command handlers. Replies go to the update's chat through the shared [`ApiClient`],
/// so they are subject to the same transformers (retries included) as every other call.
pub struct Context {
    pub update: Update,
    pub api: ApiClient,
    pub command: Option<Command>,
}

impl Context {
    pub fn new(update: Update, api: ApiClient, command: Option<Command>) -> Self {
        Self {
            update,
            api,
            command,
        }
    }

    pub fn chat_id(&self) -> Result<i64> {
        self.update.chat_id().ok_or_else(|| {
            BotError::Handler(format!("update {} has no chat to reply to", self.update.update_id))
        })
    }

    /// Arguments after the command token; empty when there are none.
    pub fn args(&self) -> &str {
        self.command.as_ref().map(|c| c.args.as_str()).unwrap_or("")
    }

    /// Sends `text` to the update's chat.
    pub async fn reply(&self, text: impl Into<String>) -> Result<Message> {
        let chat_id = self.chat_id()?;
        Ok(self.api.send_message(chat_id, text).await?)
    }

    /// Sends a photo with an optional caption to the update's chat.
    pub async fn reply_with_photo(&self, photo: InputFile, caption: Option<&str>) -> Result<Message> {
        let chat_id = self.chat_id()?;
        Ok(self
            .api
            .send_photo(chat_id, photo, caption.map(str::to_string))
            .await?)
    }
}
