//! # retry-bot
//!
//! Telegram bot whose every outbound call, direct or from inside a conversation, passes through the
//! auto-retry transformer. Commands: `/send_message`, `/send_photo`, `/conv_message`, `/conv_photo`.

pub mod bot;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod runner;

pub use bot::{create_bot, BotOptions};
pub use cli::{Cli, Commands};
pub use config::BotConfig;
pub use runner::{run_bot, Poller};
