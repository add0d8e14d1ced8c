//! Keyboard layout for menu prompts.
//!
//! Layouts are built from transport-neutral [`Button`]s; the Telegram side
//! converts them into inline markup (see `bot::ui_builder`).

use crate::callback::{CallbackAction, CallbackData};
use crate::localization::t_lang;
use crate::menu::{Choice, MenuNode};

/// A single inline button: label plus opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }

    fn for_choice(choice: &Choice) -> Self {
        Self::new(&choice.display, CallbackData::select(&choice.id).encode())
    }
}

/// Rows of buttons, top to bottom
pub type Keyboard = Vec<Vec<Button>>;

/// Arrange items into rows of two, in order. An odd leftover ends up alone
/// on the last row.
pub fn two_column_rows<T>(items: Vec<T>) -> Vec<Vec<T>> {
    let mut rows = Vec::with_capacity(items.len().div_ceil(2));
    let mut iter = items.into_iter();
    while let Some(first) = iter.next() {
        match iter.next() {
            Some(second) => rows.push(vec![first, second]),
            None => rows.push(vec![first]),
        }
    }
    rows
}

/// Keyboard listing the choices of `node`.
///
/// When `parent` is set a BACK button tagged with the parent's id is appended
/// to the list before it is laid out.
pub fn choice_keyboard(node: &MenuNode, parent: Option<&Choice>, language_code: Option<&str>) -> Keyboard {
    let mut buttons: Vec<Button> = node.items.iter().map(Button::for_choice).collect();
    if let Some(parent) = parent {
        buttons.push(Button::new(
            t_lang("button-back", language_code),
            CallbackData::tagged(CallbackAction::Back, &parent.id).encode(),
        ));
    }
    two_column_rows(buttons)
}

/// CONFIRM / CANCEL row for a chosen leaf
pub fn confirm_keyboard(choice: &Choice, language_code: Option<&str>) -> Keyboard {
    vec![vec![
        Button::new(
            t_lang("button-confirm", language_code),
            CallbackData::tagged(CallbackAction::Confirm, &choice.id).encode(),
        ),
        Button::new(
            t_lang("button-cancel", language_code),
            CallbackData::tagged(CallbackAction::Cancel, &choice.id).encode(),
        ),
    ]]
}
