//! Telegram adapter (teloxide).
//!
//! This crate implements the `grb-core` MessageSink over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::prelude::*;

pub mod router;

use grb_core::{domain::ChatId, errors::Error, ports::MessageSink, Result};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Messaging(format!("telegram error: {e}"))
    }
}

#[async_trait]
impl MessageSink for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        self.bot
            .send_chat_action(Self::tg_chat(chat_id), teloxide::types::ChatAction::Typing)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
