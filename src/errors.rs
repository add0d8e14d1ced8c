//! # Error Types Module
//!
//! This module defines the error types raised while loading the drink menu
//! and while decoding the payload attached to inline keyboard buttons.

/// Errors raised when a catalogue violates the menu tree invariants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    /// The root menu has no items at all
    EmptyRoot,
    /// A choice has an empty identifier
    EmptyId,
    /// The same identifier appears twice somewhere in the tree
    DuplicateId(String),
    /// An identifier contains the callback separator
    ReservedSeparator(String),
    /// An identifier is too long to fit in a tagged button payload
    IdTooLong(String),
    /// A leaf choice has no price
    MissingPrice(String),
    /// A leaf choice has a zero or negative price
    NonPositivePrice(String),
    /// A branch choice opens a sub-menu without items
    EmptyBranch(String),
    /// A branch choice opens a sub-menu without a question
    MissingQuestion(String),
}

impl std::fmt::Display for MenuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuError::EmptyRoot => write!(f, "Menu error: root menu has no items"),
            MenuError::EmptyId => write!(f, "Menu error: choice with empty id"),
            MenuError::DuplicateId(id) => write!(f, "Menu error: duplicate id '{id}'"),
            MenuError::ReservedSeparator(id) => {
                write!(f, "Menu error: id '{id}' contains the reserved '::' separator")
            }
            MenuError::IdTooLong(id) => {
                write!(f, "Menu error: id '{id}' does not fit in a button payload")
            }
            MenuError::MissingPrice(id) => write!(f, "Menu error: leaf '{id}' has no price"),
            MenuError::NonPositivePrice(id) => {
                write!(f, "Menu error: leaf '{id}' has a non-positive price")
            }
            MenuError::EmptyBranch(id) => write!(f, "Menu error: branch '{id}' has no items"),
            MenuError::MissingQuestion(id) => {
                write!(f, "Menu error: branch '{id}' has no question")
            }
        }
    }
}

impl std::error::Error for MenuError {}

/// Errors raised when a button payload cannot be turned into a choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The payload is empty
    Empty,
    /// The payload carries an action tag this bot never produces
    UnknownAction(String),
    /// The embedded identifier does not resolve to any choice
    DrinkNotFound(String),
}

impl std::fmt::Display for CallbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackError::Empty => write!(f, "Callback error: empty payload"),
            CallbackError::UnknownAction(action) => {
                write!(f, "Callback error: unknown action '{action}'")
            }
            CallbackError::DrinkNotFound(id) => write!(f, "Callback error: drink not found '{id}'"),
        }
    }
}

impl std::error::Error for CallbackError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = MenuError::DuplicateId("latte".to_string());
        assert_eq!(format!("{err}"), "Menu error: duplicate id 'latte'");

        let err = CallbackError::DrinkNotFound("mocha".to_string());
        assert_eq!(format!("{err}"), "Callback error: drink not found 'mocha'");
    }

    #[test]
    fn test_errors_convert_into_anyhow() {
        let err: anyhow::Error = MenuError::EmptyRoot.into();
        assert!(err.to_string().contains("root menu"));
    }
}
