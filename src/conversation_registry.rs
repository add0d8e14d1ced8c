//! Live conversations, indexed by the prompts they own.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::conversation::{CallbackOutcome, ConversationEngine};

type SharedConversation = Arc<Mutex<ConversationEngine>>;

/// Routes callbacks to the conversation owning the pressed message.
///
/// Each conversation sits behind its own mutex so presses on one prompt are
/// handled one at a time, while different conversations proceed in parallel.
pub struct ConversationRegistry {
    conversations: Mutex<HashMap<(ChatId, MessageId), SharedConversation>>,
    ttl: Duration,
}

impl ConversationRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Track a started conversation under every message it owns
    pub async fn insert(&self, engine: ConversationEngine) {
        let chat = engine.state().origin_chat;
        let owned: Vec<MessageId> = engine.state().owned_messages.iter().copied().collect();
        let shared = Arc::new(Mutex::new(engine));

        let mut conversations = self.conversations.lock().await;
        for message in owned {
            conversations.insert((chat, message), Arc::clone(&shared));
        }
    }

    /// Number of live conversations
    pub async fn len(&self) -> usize {
        let conversations = self.conversations.lock().await;
        let mut distinct: Vec<*const Mutex<ConversationEngine>> =
            conversations.values().map(Arc::as_ptr).collect();
        distinct.sort();
        distinct.dedup();
        distinct.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.lock().await.is_empty()
    }

    /// Hand a button press to the owning conversation.
    ///
    /// Finished conversations are dropped right away.
    pub async fn dispatch(&self, chat: ChatId, message: MessageId, payload: &str) -> CallbackOutcome {
        let conversation = {
            let conversations = self.conversations.lock().await;
            conversations.get(&(chat, message)).cloned()
        };
        let Some(conversation) = conversation else {
            debug!(chat_id = %chat, message_id = message.0, "Callback on unknown message");
            return CallbackOutcome::Ignored;
        };

        let mut engine = conversation.lock().await;
        let outcome = engine.on_callback(message, payload).await;
        if engine.is_terminal() {
            let owned: Vec<MessageId> = engine.state().owned_messages.iter().copied().collect();
            drop(engine);

            let mut conversations = self.conversations.lock().await;
            for message in owned {
                conversations.remove(&(chat, message));
            }
        }
        outcome
    }

    /// Drop conversations idle for longer than the TTL. Conversations busy
    /// handling a callback are left alone. Returns how many prompts were released.
    pub async fn prune_expired(&self) -> usize {
        let mut conversations = self.conversations.lock().await;
        let before = conversations.len();
        let ttl = self.ttl;

        conversations.retain(|_, conversation| match conversation.try_lock() {
            Ok(engine) => !engine.is_terminal() && engine.idle_for() <= ttl,
            Err(_) => true,
        });

        let pruned = before - conversations.len();
        if pruned > 0 {
            info!(pruned, remaining = conversations.len(), "Pruned expired coffee requests");
        }
        pruned
    }

    /// Prune on a fixed interval, forever
    pub async fn run_pruner(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.prune_expired().await;
        }
    }
}
