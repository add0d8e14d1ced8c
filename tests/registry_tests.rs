//! Routing of button presses to live conversations and expiry of idle ones.

mod common;

use common::{Harness, ALICE_CHAT};
use coffee_bot::conversation::CallbackOutcome;
use coffee_bot::conversation_registry::ConversationRegistry;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};

#[tokio::test]
async fn test_dispatch_routes_to_owner() {
    let harness = Harness::new(true, vec![]);
    let registry = ConversationRegistry::new(Duration::from_secs(600));

    let mut first = harness.engine();
    let first_message = first.start().await.unwrap();
    registry.insert(first).await;

    let mut second = harness.engine();
    let second_message = second.start().await.unwrap();
    registry.insert(second).await;

    assert_eq!(registry.len().await, 2);
    assert_eq!(
        registry.dispatch(ALICE_CHAT, first_message, "Tea").await,
        CallbackOutcome::Answered(None)
    );
    assert_eq!(
        registry.dispatch(ALICE_CHAT, second_message, "Espresso").await,
        CallbackOutcome::Answered(None)
    );
}

#[tokio::test]
async fn test_unknown_message_or_chat_is_ignored() {
    let harness = Harness::new(true, vec![]);
    let registry = ConversationRegistry::new(Duration::from_secs(600));
    let mut engine = harness.engine();
    let message = engine.start().await.unwrap();
    registry.insert(engine).await;

    assert_eq!(
        registry.dispatch(ALICE_CHAT, MessageId(message.0 + 1), "Tea").await,
        CallbackOutcome::Ignored
    );
    assert_eq!(
        registry.dispatch(ChatId(999), message, "Tea").await,
        CallbackOutcome::Ignored
    );
}

#[tokio::test]
async fn test_finished_conversation_is_dropped() {
    let harness = Harness::new(true, vec![]);
    let registry = ConversationRegistry::new(Duration::from_secs(600));
    let mut engine = harness.engine();
    let message = engine.start().await.unwrap();
    registry.insert(engine).await;

    registry.dispatch(ALICE_CHAT, message, "Espresso").await;
    registry.dispatch(ALICE_CHAT, message, "CONFIRM::Espresso").await;

    assert!(registry.is_empty().await);
    assert_eq!(harness.store.orders().len(), 1);
    assert_eq!(
        registry.dispatch(ALICE_CHAT, message, "CONFIRM::Espresso").await,
        CallbackOutcome::Ignored
    );
    assert_eq!(harness.store.orders().len(), 1);
}

#[tokio::test]
async fn test_prune_drops_only_idle_conversations() {
    let harness = Harness::new(true, vec![]);

    let fresh = ConversationRegistry::new(Duration::from_secs(3600));
    let mut engine = harness.engine();
    engine.start().await.unwrap();
    fresh.insert(engine).await;
    assert_eq!(fresh.prune_expired().await, 0);
    assert_eq!(fresh.len().await, 1);

    let short = ConversationRegistry::new(Duration::from_millis(1));
    let mut engine = harness.engine();
    let message = engine.start().await.unwrap();
    short.insert(engine).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(short.prune_expired().await, 1);
    assert!(short.is_empty().await);
    assert_eq!(
        short.dispatch(ALICE_CHAT, message, "Tea").await,
        CallbackOutcome::Ignored
    );
}
