//! Callback payload codec for inline keyboard buttons.
//!
//! A payload is either a bare choice id (`<id>`, the choice was selected) or a
//! tagged id (`<ACTION>::<id>`, perform the action on that choice).

use std::fmt;

use crate::errors::CallbackError;
use crate::menu::{Catalogue, Choice};

/// Separator between the action tag and the choice id
pub const SEPARATOR: &str = "::";

/// Telegram rejects callback data longer than this many bytes
pub const MAX_PAYLOAD_BYTES: usize = 64;

/// Longest id that still fits behind the longest action tag
pub const MAX_ID_LEN: usize = MAX_PAYLOAD_BYTES - "CONFIRM".len() - SEPARATOR.len();

/// Action tag carried by a button payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Back,
    Confirm,
    Cancel,
}

impl CallbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackAction::Back => "BACK",
            CallbackAction::Confirm => "CONFIRM",
            CallbackAction::Cancel => "CANCEL",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "BACK" => Some(CallbackAction::Back),
            "CONFIRM" => Some(CallbackAction::Confirm),
            "CANCEL" => Some(CallbackAction::Cancel),
            _ => None,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded button payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackData {
    pub action: Option<CallbackAction>,
    pub id: String,
}

impl CallbackData {
    /// Plain selection of `id`
    pub fn select(id: impl Into<String>) -> Self {
        Self {
            action: None,
            id: id.into(),
        }
    }

    /// `action` performed on `id`
    pub fn tagged(action: CallbackAction, id: impl Into<String>) -> Self {
        Self {
            action: Some(action),
            id: id.into(),
        }
    }

    /// Wire form of this payload
    pub fn encode(&self) -> String {
        match self.action {
            Some(action) => format!("{}{}{}", action.as_str(), SEPARATOR, self.id),
            None => self.id.clone(),
        }
    }

    /// Parse a wire payload.
    ///
    /// Only the first two `::`-separated tokens are considered; anything after
    /// a second separator is ignored.
    pub fn decode(payload: &str) -> Result<Self, CallbackError> {
        if payload.is_empty() {
            return Err(CallbackError::Empty);
        }

        let mut tokens = payload.split(SEPARATOR);
        let first = tokens.next().unwrap_or_default();
        match tokens.next() {
            None => Ok(Self::select(first)),
            Some(id) => {
                let action = CallbackAction::parse(first)
                    .ok_or_else(|| CallbackError::UnknownAction(first.to_string()))?;
                Ok(Self::tagged(action, id))
            }
        }
    }

    /// Look the embedded id up in the catalogue
    pub fn resolve<'a>(&self, catalogue: &'a Catalogue) -> Result<&'a Choice, CallbackError> {
        catalogue
            .find_by_id(&self.id)
            .ok_or_else(|| CallbackError::DrinkNotFound(self.id.clone()))
    }
}

/// Decode a payload and resolve its choice in one step
pub fn decode_choice<'a>(
    payload: &str,
    catalogue: &'a Catalogue,
) -> Result<(Option<CallbackAction>, &'a Choice), CallbackError> {
    let data = CallbackData::decode(payload)?;
    let choice = data.resolve(catalogue)?;
    Ok((data.action, choice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuNode;
    use rust_decimal::Decimal;

    fn catalogue() -> Catalogue {
        Catalogue::new(
            "Test",
            MenuNode::new(
                "Pick one",
                vec![Choice::leaf("Latte", "Latte", Decimal::new(300, 2))],
            ),
        )
    }

    #[test]
    fn test_tagged_payload_round_trip() {
        for action in [CallbackAction::Back, CallbackAction::Confirm, CallbackAction::Cancel] {
            let data = CallbackData::tagged(action, "Latte");
            assert_eq!(CallbackData::decode(&data.encode()).unwrap(), data);
        }
    }

    #[test]
    fn test_bare_payload_is_selection() {
        let data = CallbackData::decode("Latte").unwrap();
        assert_eq!(data, CallbackData::select("Latte"));
        assert_eq!(data.encode(), "Latte");
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(CallbackData::tagged(CallbackAction::Confirm, "Green").encode(), "CONFIRM::Green");
        assert_eq!(CallbackData::tagged(CallbackAction::Back, "Tea").encode(), "BACK::Tea");
    }

    #[test]
    fn test_extra_tokens_ignored() {
        let data = CallbackData::decode("CANCEL::Latte::extra").unwrap();
        assert_eq!(data, CallbackData::tagged(CallbackAction::Cancel, "Latte"));
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(CallbackData::decode(""), Err(CallbackError::Empty));
        assert_eq!(
            CallbackData::decode("ORDER::Latte"),
            Err(CallbackError::UnknownAction("ORDER".to_string()))
        );
    }

    #[test]
    fn test_decode_choice_resolves_or_reports_missing_drink() {
        let menu = catalogue();
        let (action, choice) = decode_choice("CONFIRM::Latte", &menu).unwrap();
        assert_eq!(action, Some(CallbackAction::Confirm));
        assert_eq!(choice.id, "Latte");

        assert_eq!(
            decode_choice("Mocha", &menu),
            Err(CallbackError::DrinkNotFound("Mocha".to_string()))
        );
        assert_eq!(
            decode_choice("BACK::", &menu),
            Err(CallbackError::DrinkNotFound(String::new()))
        );
    }

    #[test]
    fn test_longest_tagged_payload_fits() {
        let id = "x".repeat(MAX_ID_LEN);
        assert_eq!(CallbackData::tagged(CallbackAction::Confirm, id).encode().len(), MAX_PAYLOAD_BYTES);
    }
}
