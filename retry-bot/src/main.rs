//! retry-bot CLI: run the bot. Config from env and optional CLI args.

use anyhow::Result;
use clap::Parser;
use retry_bot::{run_bot, BotConfig, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = match BotConfig::load(token) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("{:#}", e);
                    std::process::exit(1);
                }
            };
            run_bot(config).await
        }
    }
}
