use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use grb_core::{
    config::Config,
    domain::InboundMessage,
    ports::{CompletionBackend, MessageSink},
    relay::Relay,
};

use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub chat_locks: Arc<ChatLocks>,
}

/// Per-chat mutexes so one chat's messages are handled in arrival order while
/// other chats proceed independently.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Long-poll Telegram and relay every text message.
pub async fn run_polling(
    cfg: Arc<Config>,
    completions: Arc<dyn CompletionBackend>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Startup check is best-effort: the bot keeps polling even when the
    // initial `get_me` fails.
    match bot.get_me().await {
        Ok(me) => info!("started bot: @{}", me.username()),
        Err(e) => warn!("failed to register bot: {e}"),
    }

    let messenger: Arc<dyn MessageSink> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        relay: Arc::new(Relay::new(completions, messenger)),
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Only text messages are relayed; photos, stickers, etc. never reach the
    // completion backend.
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if text.trim().is_empty() {
        return Ok(());
    }

    let chat_id = msg.chat.id.0;
    let inbound = InboundMessage {
        chat_id: grb_core::domain::ChatId(chat_id),
        text: text.to_string(),
    };

    let _guard = state.chat_locks.lock_chat(chat_id).await;
    state.relay.handle(inbound).await;

    Ok(())
}
