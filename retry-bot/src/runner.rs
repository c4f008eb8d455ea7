//! Long-poll runner.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context as _, Result};
use bot_api::GetUpdates;
use bot_core::init_tracing;
use dispatcher::Dispatcher;
use tracing::{debug, error, info, instrument};

use crate::bot::{create_bot, BotOptions};
use crate::config::BotConfig;

const POLL_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Fetches updates with `getUpdates` and dispatches them one at a time, in order.
pub struct Poller {
    dispatcher: Dispatcher,
    offset: Option<i64>,
    poll_timeout_secs: u32,
}

impl Poller {
    pub fn new(dispatcher: Dispatcher, poll_timeout_secs: u32) -> Self {
        Self {
            dispatcher,
            offset: None,
            poll_timeout_secs,
        }
    }

    /// Offset sent with the next `getUpdates`: last seen `update_id` + 1.
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetches one batch and dispatches each update before returning. Returns the batch size.
    pub async fn poll_once(&mut self) -> bot_core::Result<usize> {
        let params = GetUpdates {
            offset: self.offset,
            timeout: Some(self.poll_timeout_secs),
            allowed_updates: Some(vec!["message".to_string()]),
            ..GetUpdates::default()
        };
        let updates = self.dispatcher.api().get_updates(&params).await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), offset = ?self.offset, "Received updates");
        }
        for update in &updates {
            self.offset = Some(update.update_id + 1);
            self.dispatcher.dispatch(update).await;
        }
        Ok(updates.len())
    }

    /// Polls until Ctrl-C. Failed polls are logged and retried after a short pause.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")
        })
        .await
    }

    /// Polls until `shutdown` resolves. The same `shutdown` future is polled across iterations, so a
    /// signal delivered while a batch is being dispatched is seen on the next turn.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        info!(poll_timeout_secs = self.poll_timeout_secs, "Polling started");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                signal = &mut shutdown => {
                    signal?;
                    info!("Shutdown requested, polling stopped");
                    return Ok(());
                }
                polled = self.poll_once() => {
                    if let Err(e) = polled {
                        error!(error = %e, "getUpdates failed");
                        tokio::time::sleep(POLL_ERROR_PAUSE).await;
                    }
                }
            }
        }
    }
}

/// Main entry: validate config, init logging, build the bot, fetch its identity, then poll.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(&config.log_file)?;

    info!(api_url = %config.api_url, "Initializing bot");
    let dispatcher = create_bot(&config, BotOptions::default())?;
    let me = dispatcher
        .api()
        .get_me()
        .await
        .context("getMe failed; check the bot token and TELEGRAM_API_URL")?;
    info!(bot_id = me.id, username = ?me.username, "Bot started");

    let dispatcher = match me.username {
        Some(username) => dispatcher.with_bot_username(username),
        None => dispatcher,
    };
    Poller::new(dispatcher, config.poll_timeout_secs).run().await
}
