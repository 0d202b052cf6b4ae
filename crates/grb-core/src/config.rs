use std::{env, time::Duration};

use crate::{errors::Error, Result};

/// Completion endpoint used when `GPT_COMPLETION_URL` is not set.
pub const DEFAULT_COMPLETION_URL: &str =
    "https://api.openai.com/v1/engines/davinci-codex/completions";

const DEFAULT_MAX_TOKENS: u32 = 1600;
const DEFAULT_TEMPERATURE: f32 = 0.5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Typed configuration for the relay.
///
/// Built once at startup from the two required credentials plus optional
/// environment overrides, then handed to the adapters. Nothing here mutates
/// after construction.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub openai_api_key: String,

    // Completion endpoint tuning
    pub completion_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(
        telegram_bot_token: impl Into<String>,
        openai_api_key: impl Into<String>,
    ) -> Result<Self> {
        let telegram_bot_token = telegram_bot_token.into();
        let openai_api_key = openai_api_key.into();

        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }
        if openai_api_key.trim().is_empty() {
            return Err(Error::Config(
                "OpenAI API key must not be empty".to_string(),
            ));
        }

        let completion_url = env_str("GPT_COMPLETION_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string());
        let max_tokens = env_u32("GPT_MAX_TOKENS").unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = env_f32("GPT_TEMPERATURE").unwrap_or(DEFAULT_TEMPERATURE);
        let request_timeout =
            Duration::from_secs(env_u64("GPT_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            telegram_bot_token,
            openai_api_key,
            completion_url,
            max_tokens,
            temperature,
            request_timeout,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_f32(key: &str) -> Option<f32> {
    env_str(key).and_then(|s| s.trim().parse::<f32>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
