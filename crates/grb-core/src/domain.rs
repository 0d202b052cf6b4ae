/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// One text message pulled from the update stream.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub text: String,
}

/// A reply addressed back to the chat it came from.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub text: String,
}
