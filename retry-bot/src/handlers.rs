//! The bot's commands and conversations.
//!
//! Direct commands reply through [`Context`]; the conversation variants send the same content from inside a
//! single-step conversation, wrapped in [`StepContext::external`].

use async_trait::async_trait;
use bot_api::InputFile;
use bot_core::{BotError, Result};
use conversations::{Conversation, StepContext, Transition};
use dispatcher::{CommandHandler, Context};

pub const SEND_MESSAGE_COMMAND: &str = "send_message";
pub const SEND_PHOTO_COMMAND: &str = "send_photo";
pub const CONV_MESSAGE_COMMAND: &str = "conv_message";
pub const CONV_PHOTO_COMMAND: &str = "conv_photo";

pub const CONVERSATION_SEND_MESSAGE: &str = "conversation_send_message";
pub const CONVERSATION_SEND_PHOTO: &str = "conversation_send_photo";

pub const PHOTO_URL: &str = "https://picsum.photos/200/300";

/// `/send_message`
pub struct SendMessageCommand;

#[async_trait]
impl CommandHandler for SendMessageCommand {
    async fn handle(&self, ctx: &Context) -> Result<()> {
        ctx.reply("Message sent without conversation").await?;
        Ok(())
    }
}

/// `/send_photo`
pub struct SendPhotoCommand;

#[async_trait]
impl CommandHandler for SendPhotoCommand {
    async fn handle(&self, ctx: &Context) -> Result<()> {
        ctx.reply_with_photo(InputFile::url(PHOTO_URL), Some("Photo sent without conversation"))
            .await?;
        Ok(())
    }
}

/// Entered by `/conv_message`.
pub struct ConversationSendMessage;

#[async_trait]
impl Conversation for ConversationSendMessage {
    fn name(&self) -> &str {
        CONVERSATION_SEND_MESSAGE
    }

    async fn step(&self, _step: usize, cx: &mut StepContext<'_>) -> Result<Transition> {
        let chat_id = cx.chat_id()?;
        cx.external("reply", |api| async move {
            api.send_message(chat_id, "Message sent inside conversation")
                .await
                .map_err(BotError::from)
        })
        .await?;
        Ok(Transition::Done)
    }
}

/// Entered by `/conv_photo`.
pub struct ConversationSendPhoto;

#[async_trait]
impl Conversation for ConversationSendPhoto {
    fn name(&self) -> &str {
        CONVERSATION_SEND_PHOTO
    }

    async fn step(&self, _step: usize, cx: &mut StepContext<'_>) -> Result<Transition> {
        let chat_id = cx.chat_id()?;
        cx.external("reply_with_photo", |api| async move {
            api.send_photo(
                chat_id,
                InputFile::url(PHOTO_URL),
                Some("Photo sent inside conversation".to_string()),
            )
            .await
            .map_err(BotError::from)
        })
        .await?;
        Ok(Transition::Done)
    }
}
