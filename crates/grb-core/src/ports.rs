use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Hexagonal port for the text-completion backend.
///
/// The relay needs exactly one operation: turn the user's text into a reply.
/// Transport and parse failures come back as `Err`; the relay decides what
/// the user sees.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, user_input: &str) -> Result<String>;
}

/// Hexagonal port for delivering replies to the chat platform.
///
/// Telegram is the first implementation; the shape leaves room for other
/// messengers behind the same interface.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// "Typing" indicator shown while a completion is in flight. Best-effort.
    async fn send_typing(&self, chat_id: ChatId) -> Result<()>;
}
