//! Conversation engine driving one "choose a drink" flow.
//!
//! A conversation starts by sending the catalogue's root question, then reacts
//! to button presses on the messages it owns:
//!
//! - plain selection of a branch opens its sub-menu (with a BACK button)
//! - plain selection of a leaf asks for confirmation
//! - BACK re-renders the root menu
//! - CONFIRM places the order and ends the conversation
//! - CANCEL ends the conversation without an order

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::types::{ChatId, MessageId, UserId};
use tracing::{debug, error, info, warn};

use crate::callback::{decode_choice, CallbackAction};
use crate::keyboard::{choice_keyboard, confirm_keyboard, Keyboard};
use crate::localization::{t_args_lang, t_lang};
use crate::menu::{Catalogue, Choice, ChoiceKind};
use crate::order::{format_price, OrderFinalizer, OrderRecord};

/// Outbound chat operations the engine relies on
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a prompt with an inline keyboard, returning the new message id
    async fn send_prompt(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<MessageId>;

    /// Replace the text of a prompt; an empty keyboard leaves none attached
    async fn edit_prompt(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()>;

    async fn remove_keyboard(&self, chat: ChatId, message: MessageId) -> Result<()>;

    /// Plain message to a chat
    async fn notify(&self, chat: ChatId, text: &str) -> Result<()>;
}

/// Shared, read-only collaborators of every conversation
#[derive(Clone)]
pub struct Services {
    pub catalogue: Arc<Catalogue>,
    pub transport: Arc<dyn ChatTransport>,
    pub finalizer: Arc<OrderFinalizer>,
}

/// The user who started the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Originator {
    pub user_id: UserId,
    pub user_name: String,
    pub language_code: Option<String>,
}

/// Where the conversation currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Showing a menu: the root when `branch` is `None`, otherwise the
    /// sub-menu opened by that branch
    AwaitingChoice { branch: Option<String> },
    /// Showing CONFIRM / CANCEL for a leaf
    AwaitingConfirmation { leaf: String },
    Terminal,
}

/// Mutable per-conversation state
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub origin_chat: ChatId,
    pub owned_messages: HashSet<MessageId>,
    pub step: Step,
    pub last_activity: Instant,
}

impl ConversationState {
    fn new(origin_chat: ChatId) -> Self {
        Self {
            origin_chat,
            owned_messages: HashSet::new(),
            step: Step::AwaitingChoice { branch: None },
            last_activity: Instant::now(),
        }
    }
}

/// What the callback handler should do after a button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The pressed message is not owned by this conversation
    Ignored,
    /// Processed; answer the callback with the optional toast text
    Answered(Option<String>),
}

pub struct ConversationEngine {
    services: Services,
    originator: Originator,
    state: ConversationState,
}

impl ConversationEngine {
    pub fn new(services: Services, origin_chat: ChatId, originator: Originator) -> Self {
        Self {
            services,
            originator,
            state: ConversationState::new(origin_chat),
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn originator(&self) -> &Originator {
        &self.originator
    }

    pub fn owns(&self, message: MessageId) -> bool {
        self.state.owned_messages.contains(&message)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.step == Step::Terminal
    }

    pub fn idle_for(&self) -> Duration {
        self.state.last_activity.elapsed()
    }

    fn lang(&self) -> Option<&str> {
        self.originator.language_code.as_deref()
    }

    /// Send the root question and remember the prompt as ours
    pub async fn start(&mut self) -> Result<MessageId> {
        let root = &self.services.catalogue.root;
        let keyboard = choice_keyboard(root, None, self.lang());
        let message = self
            .services
            .transport
            .send_prompt(self.state.origin_chat, &root.question, &keyboard)
            .await?;

        self.state.owned_messages.insert(message);
        self.state.step = Step::AwaitingChoice { branch: None };
        self.state.last_activity = Instant::now();

        info!(
            user_id = %self.originator.user_id,
            chat_id = %self.state.origin_chat,
            message_id = message.0,
            "Coffee request started"
        );
        Ok(message)
    }

    /// Process one button press on `message` carrying `payload`.
    ///
    /// Never fails: decoding and transport problems become the generic
    /// failure toast and leave the state as it was.
    pub async fn on_callback(&mut self, message: MessageId, payload: &str) -> CallbackOutcome {
        if !self.owns(message) || self.is_terminal() {
            return CallbackOutcome::Ignored;
        }
        self.state.last_activity = Instant::now();

        let catalogue = Arc::clone(&self.services.catalogue);
        let (action, choice) = match decode_choice(payload, &catalogue) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(
                    user_id = %self.originator.user_id,
                    message_id = message.0,
                    payload,
                    error = %e,
                    "Unusable callback payload"
                );
                return self.something_went_wrong();
            }
        };

        debug!(
            user_id = %self.originator.user_id,
            action = ?action,
            choice = %choice.id,
            "Callback decoded"
        );

        let result = match action {
            None => self.select(message, choice).await,
            Some(CallbackAction::Back) => self.back(message, choice).await,
            Some(CallbackAction::Confirm) => self.confirm(message, choice).await,
            Some(CallbackAction::Cancel) => self.cancel(message).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    user_id = %self.originator.user_id,
                    message_id = message.0,
                    error = %e,
                    "Failed to update coffee request"
                );
                self.something_went_wrong()
            }
        }
    }

    fn something_went_wrong(&self) -> CallbackOutcome {
        CallbackOutcome::Answered(Some(t_lang("something-went-wrong", self.lang())))
    }

    async fn edit(&self, message: MessageId, text: &str, keyboard: &Keyboard) -> Result<()> {
        self.services
            .transport
            .edit_prompt(self.state.origin_chat, message, text, keyboard)
            .await
    }

    async fn select(&mut self, message: MessageId, choice: &Choice) -> Result<CallbackOutcome> {
        info!(user_id = %self.originator.user_id, choice = %choice.id, "Selected");

        match &choice.kind {
            ChoiceKind::Leaf { .. } => {
                let text = t_args_lang("confirm-choice", &[("drink", &choice.id)], self.lang());
                self.edit(message, &text, &confirm_keyboard(choice, self.lang()))
                    .await?;
                self.state.step = Step::AwaitingConfirmation {
                    leaf: choice.id.clone(),
                };
            }
            ChoiceKind::Branch { child } => {
                let keyboard = choice_keyboard(child, Some(choice), self.lang());
                self.edit(message, &child.question, &keyboard).await?;
                self.state.step = Step::AwaitingChoice {
                    branch: Some(choice.id.clone()),
                };
            }
        }
        Ok(CallbackOutcome::Answered(None))
    }

    /// BACK always returns to the root menu, whatever the current depth
    async fn back(&mut self, message: MessageId, from: &Choice) -> Result<CallbackOutcome> {
        info!(user_id = %self.originator.user_id, from = %from.id, "Back to root menu");

        let root = &self.services.catalogue.root;
        let keyboard = choice_keyboard(root, None, self.lang());
        self.edit(message, &root.question, &keyboard).await?;
        self.state.step = Step::AwaitingChoice { branch: None };
        Ok(CallbackOutcome::Answered(None))
    }

    async fn confirm(&mut self, message: MessageId, choice: &Choice) -> Result<CallbackOutcome> {
        let Some(price) = choice.price() else {
            warn!(
                user_id = %self.originator.user_id,
                choice = %choice.id,
                "CONFIRM on a choice without price"
            );
            return Ok(self.something_went_wrong());
        };

        let order = OrderRecord {
            user_id: self.originator.user_id,
            user_name: self.originator.user_name.clone(),
            chat_id: self.state.origin_chat,
            beverage_id: choice.id.clone(),
            price,
            placed_at: Utc::now(),
        };

        let placed = self.services.finalizer.finalize(&order).await;
        self.state.step = Step::Terminal;

        let (text, toast) = if placed {
            let text = t_args_lang(
                "order-confirmed",
                &[("drink", &order.beverage_id), ("price", &format_price(order.price))],
                self.lang(),
            );
            (text, Some(t_lang("good-choice", self.lang())))
        } else {
            (t_lang("something-went-wrong", self.lang()), None)
        };

        self.close(message, &text).await;
        Ok(CallbackOutcome::Answered(toast))
    }

    async fn cancel(&mut self, message: MessageId) -> Result<CallbackOutcome> {
        info!(user_id = %self.originator.user_id, "Coffee request cancelled");

        self.state.step = Step::Terminal;
        let text = t_lang("order-cancelled", self.lang());
        self.close(message, &text).await;
        Ok(CallbackOutcome::Answered(None))
    }

    /// Drop the keyboard and leave `text` as the final content of the prompt.
    ///
    /// The keyboard goes first: Telegram refuses to remove a markup that an
    /// edit without markup already removed.
    async fn close(&self, message: MessageId, text: &str) {
        let chat = self.state.origin_chat;
        if let Err(e) = self.services.transport.remove_keyboard(chat, message).await {
            warn!(chat_id = %chat, message_id = message.0, error = %e, "Failed to remove keyboard");
        }
        if let Err(e) = self.edit(message, text, &Keyboard::new()).await {
            error!(chat_id = %chat, message_id = message.0, error = %e, "Failed to edit final message");
        }
    }
}
