//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use crate::conversation::CallbackOutcome;
use crate::localization::t_lang;

use super::AppState;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, app: Arc<AppState>) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    let lang = q.from.language_code.as_deref();
    let data = q.data.as_deref().unwrap_or("");

    let toast = match &q.message {
        Some(msg) => match app.registry.dispatch(msg.chat().id, msg.id(), data).await {
            CallbackOutcome::Answered(toast) => toast,
            // Not owned by any live request: it finished or expired
            CallbackOutcome::Ignored => Some(t_lang("conversation-expired", lang)),
        },
        None => None,
    };

    // Answer the callback query to remove the loading state
    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(text) = toast {
        answer = answer.text(text);
    }
    answer.await?;

    Ok(())
}
