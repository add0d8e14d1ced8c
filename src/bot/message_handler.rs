//! Message Handler module for commands and plain text messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info};

use crate::conversation::{ConversationEngine, Originator};
use crate::localization::t_lang;
use crate::order::Watcher;

use super::AppState;

/// Bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Coffee bot commands:")]
pub enum Command {
    #[command(description = "welcome message")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "order a drink")]
    Coffee,
    #[command(description = "get notified about other orders")]
    Watch,
    #[command(description = "stop order notifications")]
    Unwatch,
}

fn language_code(msg: &Message) -> Option<&str> {
    msg.from.as_ref().and_then(|user| user.language_code.as_deref())
}

/// Handle parsed bot commands
pub async fn command_handler(bot: Bot, msg: Message, cmd: Command, app: Arc<AppState>) -> Result<()> {
    let lang = language_code(&msg);
    info!(chat_id = %msg.chat.id, command = ?cmd, "Received command");

    match cmd {
        Command::Start => {
            let text = format!("{}\n\n{}", t_lang("welcome", lang), t_lang("help", lang));
            bot.send_message(msg.chat.id, text).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, t_lang("help", lang)).await?;
        }
        Command::Coffee => start_coffee_request(&bot, &msg, &app).await?,
        Command::Watch => {
            let Some(user) = msg.from.as_ref() else {
                return Ok(());
            };
            let watcher = Watcher {
                user_id: user.id,
                chat_id: msg.chat.id,
            };
            let reply = match app.watchers.add(watcher).await {
                Ok(_) => t_lang("watch-enabled", lang),
                Err(e) => {
                    error!(user_id = %user.id, error = %e, "Failed to register watcher");
                    t_lang("something-went-wrong", lang)
                }
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
        Command::Unwatch => {
            let Some(user) = msg.from.as_ref() else {
                return Ok(());
            };
            let reply = match app.watchers.remove(user.id).await {
                Ok(true) => t_lang("watch-disabled", lang),
                Ok(false) => t_lang("watch-not-registered", lang),
                Err(e) => {
                    error!(user_id = %user.id, error = %e, "Failed to remove watcher");
                    t_lang("something-went-wrong", lang)
                }
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
    }

    Ok(())
}

/// Any other text message starts a new coffee request
pub async fn message_handler(bot: Bot, msg: Message, app: Arc<AppState>) -> Result<()> {
    if msg.text().is_some() {
        start_coffee_request(&bot, &msg, &app).await?;
    } else {
        debug!(chat_id = %msg.chat.id, "Ignoring non-text message");
    }
    Ok(())
}

/// Send the root menu and register the new conversation
pub async fn start_coffee_request(bot: &Bot, msg: &Message, app: &AppState) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Message without sender, not starting a request");
        return Ok(());
    };

    let originator = Originator {
        user_id: user.id,
        user_name: user.first_name.clone(),
        language_code: user.language_code.clone(),
    };
    let mut engine = ConversationEngine::new(app.services.clone(), msg.chat.id, originator);

    match engine.start().await {
        Ok(_) => app.registry.insert(engine).await,
        Err(e) => {
            error!(user_id = %user.id, error = %e, "Failed to start coffee request");
            bot.send_message(msg.chat.id, t_lang("menu-unavailable", language_code(msg)))
                .await?;
        }
    }
    Ok(())
}
