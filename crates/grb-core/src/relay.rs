use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    domain::{InboundMessage, OutboundMessage},
    ports::{CompletionBackend, MessageSink},
};

/// Reply substituted for a genuine completion when the backend call fails.
pub const FALLBACK_REPLY: &str = "Error: Could not connect to ChatGPT API.";

/// Orchestrates one inbound-message-to-reply cycle.
///
/// Owns the delivery policy: at most one reply per inbound message, always to
/// the chat the message came from, and never an empty one.
pub struct Relay {
    completions: Arc<dyn CompletionBackend>,
    sink: Arc<dyn MessageSink>,
}

impl Relay {
    pub fn new(completions: Arc<dyn CompletionBackend>, sink: Arc<dyn MessageSink>) -> Self {
        Self { completions, sink }
    }

    /// Handle one inbound message to completion.
    ///
    /// Backend failures degrade to [`FALLBACK_REPLY`]; sink failures are
    /// logged and swallowed so the update loop keeps running.
    pub async fn handle(&self, msg: InboundMessage) {
        // Updates without usable text are ignored outright.
        if msg.text.trim().is_empty() {
            return;
        }

        info!("received message: {}", msg.text);

        // Typing indicator while the completion is in flight. Best-effort.
        let _ = self.sink.send_typing(msg.chat_id).await;

        let reply = match self.completions.complete(&msg.text).await {
            Ok(text) => text,
            Err(e) => {
                warn!("completion failed: {e}");
                FALLBACK_REPLY.to_string()
            }
        };

        // Never deliver an empty reply.
        if reply.trim().is_empty() {
            return;
        }

        let out = OutboundMessage {
            chat_id: msg.chat_id,
            text: reply,
        };
        if let Err(e) = self.sink.send_text(out.chat_id, &out.text).await {
            warn!("failed to send message: {e}");
        }
    }
}
