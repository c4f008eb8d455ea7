//! # bot-core
//!
//! Core types shared by every layer of the bot: Bot API objects ([`Update`], [`Message`], [`Chat`], [`User`]),
//! the error taxonomy ([`ApiError`], [`ConversationError`], [`BotError`]) and tracing initialization.
//! Transport-agnostic; used by bot-api, conversations, dispatcher and retry-bot.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{ApiError, ApiResult, BotError, ConversationError, ErrorKind, Result};
pub use logger::init_tracing;
pub use types::{Chat, Message, ResponseParameters, Update, User};
