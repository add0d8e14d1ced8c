//! In-memory collaborators shared by the integration tests
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use teloxide::types::{ChatId, MessageId, UserId};

use coffee_bot::conversation::{ChatTransport, ConversationEngine, Originator, Services};
use coffee_bot::keyboard::Keyboard;
use coffee_bot::menu::{Catalogue, Choice, MenuNode};
use coffee_bot::order::{OrderFinalizer, OrderRecord, OrderStore, Watcher, WatcherRegistry};

pub const ALICE: UserId = UserId(100);
pub const ALICE_CHAT: ChatId = ChatId(100);

/// Every outbound call made through the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        chat: ChatId,
        text: String,
        keyboard: Keyboard,
    },
    Edit {
        chat: ChatId,
        message: MessageId,
        text: String,
        keyboard: Keyboard,
    },
    RemoveKeyboard {
        chat: ChatId,
        message: MessageId,
    },
    Notify {
        chat: ChatId,
        text: String,
    },
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_message: AtomicI32,
    fail_edits: AtomicBool,
    unreachable_chats: Mutex<HashSet<ChatId>>,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn make_unreachable(&self, chat: ChatId) {
        self.unreachable_chats.lock().unwrap().insert(chat);
    }

    pub fn notifications(&self) -> Vec<(ChatId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Notify { chat, text } => Some((chat, text)),
                _ => None,
            })
            .collect()
    }

    pub fn last_edit(&self) -> Option<(String, Keyboard)> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Edit { text, keyboard, .. } => Some((text, keyboard)),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_prompt(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<MessageId> {
        self.record(Call::Send {
            chat,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        let id = self.next_message.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MessageId(id))
    }

    async fn edit_prompt(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            bail!("message can't be edited");
        }
        self.record(Call::Edit {
            chat,
            message,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn remove_keyboard(&self, chat: ChatId, message: MessageId) -> Result<()> {
        self.record(Call::RemoveKeyboard { chat, message });
        Ok(())
    }

    async fn notify(&self, chat: ChatId, text: &str) -> Result<()> {
        if self.unreachable_chats.lock().unwrap().contains(&chat) {
            bail!("bot was blocked by the user");
        }
        self.record(Call::Notify {
            chat,
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Order store that records orders and answers with a fixed outcome
pub struct FakeOrderStore {
    pub orders: Mutex<Vec<OrderRecord>>,
    succeed: bool,
}

impl FakeOrderStore {
    pub fn new(succeed: bool) -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            succeed,
        }
    }

    pub fn orders(&self) -> Vec<OrderRecord> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderStore for FakeOrderStore {
    async fn place_order(&self, order: &OrderRecord) -> bool {
        self.orders.lock().unwrap().push(order.clone());
        self.succeed
    }
}

pub struct FakeWatchers(pub Vec<Watcher>);

#[async_trait]
impl WatcherRegistry for FakeWatchers {
    async fn list_watchers(&self) -> Result<Vec<Watcher>> {
        Ok(self.0.clone())
    }
}

pub fn watcher(id: u64) -> Watcher {
    Watcher {
        user_id: UserId(id),
        chat_id: ChatId(id as i64),
    }
}

/// Root: Espresso (leaf, 2.50) and Tea (branch: Green 1.80, Black 1.80)
pub fn tea_catalogue() -> Catalogue {
    Catalogue::new(
        "Corner Cafe",
        MenuNode::new(
            "What would you like?",
            vec![
                Choice::leaf("Espresso", "Espresso", Decimal::new(250, 2)),
                Choice::branch(
                    "Tea",
                    "Tea",
                    MenuNode::new(
                        "Which tea?",
                        vec![
                            Choice::leaf("Green", "Green", Decimal::new(180, 2)),
                            Choice::leaf("Black", "Black", Decimal::new(180, 2)),
                        ],
                    ),
                ),
            ],
        ),
    )
}

/// Wiring of one test: fakes plus the services built on them
pub struct Harness {
    pub transport: Arc<RecordingTransport>,
    pub store: Arc<FakeOrderStore>,
    pub services: Services,
}

impl Harness {
    pub fn new(store_succeeds: bool, watchers: Vec<Watcher>) -> Self {
        let transport = Arc::new(RecordingTransport::default());
        let store = Arc::new(FakeOrderStore::new(store_succeeds));
        let finalizer = OrderFinalizer::new(
            store.clone(),
            Arc::new(FakeWatchers(watchers)),
            transport.clone(),
        );
        let services = Services {
            catalogue: Arc::new(tea_catalogue()),
            transport: transport.clone(),
            finalizer: Arc::new(finalizer),
        };
        Self {
            transport,
            store,
            services,
        }
    }

    pub fn engine(&self) -> ConversationEngine {
        ConversationEngine::new(
            self.services.clone(),
            ALICE_CHAT,
            Originator {
                user_id: ALICE,
                user_name: "Alice".to_string(),
                language_code: Some("en".to_string()),
            },
        )
    }
}

pub fn payloads(keyboard: &Keyboard) -> Vec<Vec<String>> {
    keyboard
        .iter()
        .map(|row| row.iter().map(|button| button.data.clone()).collect())
        .collect()
}
