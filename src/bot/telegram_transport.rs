//! [`ChatTransport`] implementation on top of the Telegram Bot API

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::MessageId;

use crate::conversation::ChatTransport;
use crate::keyboard::Keyboard;

use super::ui_builder::to_inline_markup;

/// Sends and edits coffee prompts through a teloxide [`Bot`]
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_prompt(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> Result<MessageId> {
        let mut request = self.bot.send_message(chat, text);
        if let Some(markup) = to_inline_markup(keyboard) {
            request = request.reply_markup(markup);
        }
        let sent = request.await?;
        Ok(sent.id)
    }

    async fn edit_prompt(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()> {
        let mut request = self.bot.edit_message_text(chat, message, text);
        if let Some(markup) = to_inline_markup(keyboard) {
            request = request.reply_markup(markup);
        }
        request.await?;
        Ok(())
    }

    async fn remove_keyboard(&self, chat: ChatId, message: MessageId) -> Result<()> {
        // No markup in the request clears the inline keyboard
        self.bot.edit_message_reply_markup(chat, message).await?;
        Ok(())
    }

    async fn notify(&self, chat: ChatId, text: &str) -> Result<()> {
        self.bot.send_message(chat, text).await?;
        Ok(())
    }
}
