//! UI Builder module for turning keyboard layouts into Telegram markup

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::keyboard::Keyboard;

/// Convert a layout into inline keyboard markup, `None` when it has no buttons
pub fn to_inline_markup(keyboard: &Keyboard) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            row.iter()
                .map(|button| InlineKeyboardButton::callback(button.text.clone(), button.data.clone()))
                .collect()
        })
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}
