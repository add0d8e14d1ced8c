//! Bot module for handling Telegram interactions
//!
//! - `message_handler`: commands and plain text messages
//! - `callback_handler`: inline keyboard callback queries
//! - `ui_builder`: converts keyboard layouts to Telegram markup
//! - `telegram_transport`: chat operations used by the conversation engine

pub mod callback_handler;
pub mod message_handler;
pub mod telegram_transport;
pub mod ui_builder;

use std::sync::Arc;
use teloxide::dispatching::{HandlerExt, UpdateHandler};
use teloxide::prelude::*;

use crate::conversation::Services;
use crate::conversation_registry::ConversationRegistry;
use crate::db::PgWatcherRegistry;

pub use callback_handler::callback_handler;
pub use message_handler::{command_handler, message_handler, Command};
pub use telegram_transport::TelegramTransport;

/// Everything the handlers share
pub struct AppState {
    pub services: Services,
    pub registry: Arc<ConversationRegistry>,
    pub watchers: Arc<PgWatcherRegistry>,
}

/// Dispatcher tree: commands, then any other message, then button presses
pub fn schema() -> UpdateHandler<anyhow::Error> {
    let messages = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(command_handler))
        .branch(dptree::endpoint(message_handler));

    dptree::entry()
        .branch(messages)
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
