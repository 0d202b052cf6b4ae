use std::sync::Arc;

use clap::Parser;

use grb_core::{config::Config, logging, ports::CompletionBackend};
use grb_openai::OpenAiCompletions;

/// Telegram bot that relays chat messages to a GPT completion endpoint.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Telegram bot token.
    telegram_bot_token: String,

    /// OpenAI API key.
    openai_api_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init("grb")?;

    let cfg = Arc::new(Config::new(args.telegram_bot_token, args.openai_api_key)?);

    let completions: Arc<dyn CompletionBackend> = Arc::new(OpenAiCompletions::new(&cfg));

    grb_telegram::router::run_polling(cfg, completions).await
}
