//! # Menu Tree Module
//!
//! This module defines the drink catalogue: a recursive tree of menu nodes whose
//! choices are either leaves (a drink with a price) or branches (a choice that
//! opens a sub-menu).
//!
//! ## Core Concepts
//!
//! - **Catalogue**: the titled entry point of the menu, loaded once at startup
//! - **MenuNode**: a question plus the ordered choices shown under it
//! - **Choice**: one selectable entry, addressed by an id that is unique across
//!   the whole tree
//!
//! ## Usage
//!
//! ```rust
//! use coffee_bot::menu::Catalogue;
//!
//! let json = r#"{
//!     "title": "Corner Cafe",
//!     "entry": {
//!         "question": "What would you like?",
//!         "items": [
//!             { "id": "Espresso", "display": "Espresso", "price": 2.5 },
//!             { "id": "Tea", "display": "Tea", "entry": {
//!                 "question": "Which tea?",
//!                 "items": [{ "id": "Green", "display": "Green", "price": 1.8 }]
//!             }}
//!         ]
//!     }
//! }"#;
//!
//! let catalogue = Catalogue::from_json(json).unwrap();
//! assert_eq!(catalogue.flatten().len(), 3);
//! assert!(catalogue.find_by_id("Green").unwrap().is_leaf());
//! ```

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::callback::{MAX_ID_LEN, SEPARATOR};
use crate::errors::MenuError;

/// A question plus the ordered list of choices displayed under it
#[derive(Debug, Clone, PartialEq)]
pub struct MenuNode {
    /// Prompt shown when this node is displayed
    pub question: String,
    /// Children in display order
    pub items: Vec<Choice>,
}

/// One selectable entry of the menu
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    /// Identifier, unique across the whole catalogue
    pub id: String,
    /// Button label
    pub display: String,
    /// Whether this is a priced drink or a sub-menu
    pub kind: ChoiceKind,
}

/// Leaf or branch
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceKind {
    /// A drink that can be ordered
    Leaf { price: Decimal },
    /// A choice that opens a sub-menu
    Branch { child: MenuNode },
}

/// The menu tree's entry point
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogue {
    pub title: String,
    pub root: MenuNode,
}

// On-disk shape: `{title, entry: {question, items: [{id, display, price?, entry?}]}}`
#[derive(Debug, Deserialize)]
struct RawCatalogue {
    title: String,
    entry: RawNode,
}

#[derive(Debug, Default, Deserialize)]
struct RawNode {
    #[serde(default)]
    question: String,
    #[serde(default)]
    items: Vec<RawChoice>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    id: String,
    display: String,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    entry: Option<RawNode>,
}

impl Choice {
    /// Create a priced leaf choice
    pub fn leaf(id: impl Into<String>, display: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            display: display.into(),
            kind: ChoiceKind::Leaf { price },
        }
    }

    /// Create a branch choice opening `child`
    pub fn branch(id: impl Into<String>, display: impl Into<String>, child: MenuNode) -> Self {
        Self {
            id: id.into(),
            display: display.into(),
            kind: ChoiceKind::Branch { child },
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ChoiceKind::Leaf { .. })
    }

    /// Price of a leaf, `None` for branches
    pub fn price(&self) -> Option<Decimal> {
        match &self.kind {
            ChoiceKind::Leaf { price } => Some(*price),
            ChoiceKind::Branch { .. } => None,
        }
    }

    /// Sub-menu of a branch, `None` for leaves
    pub fn child(&self) -> Option<&MenuNode> {
        match &self.kind {
            ChoiceKind::Leaf { .. } => None,
            ChoiceKind::Branch { child } => Some(child),
        }
    }

    fn from_raw(raw: RawChoice) -> Result<Self, MenuError> {
        let RawChoice {
            id,
            display,
            price,
            entry,
        } = raw;

        match entry {
            Some(node) if !node.items.is_empty() => {
                if node.question.trim().is_empty() {
                    return Err(MenuError::MissingQuestion(id));
                }
                let child = MenuNode::from_raw(node)?;
                Ok(Choice::branch(id, display, child))
            }
            // A sub-menu was announced with a question but nothing to choose from
            Some(node) if price.is_none() && !node.question.trim().is_empty() => {
                Err(MenuError::EmptyBranch(id))
            }
            _ => match price {
                None => Err(MenuError::MissingPrice(id)),
                Some(price) if price <= Decimal::ZERO => Err(MenuError::NonPositivePrice(id)),
                Some(price) => Ok(Choice::leaf(id, display, price)),
            },
        }
    }
}

impl MenuNode {
    pub fn new(question: impl Into<String>, items: Vec<Choice>) -> Self {
        Self {
            question: question.into(),
            items,
        }
    }

    fn from_raw(raw: RawNode) -> Result<Self, MenuError> {
        let items = raw
            .items
            .into_iter()
            .map(Choice::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            question: raw.question,
            items,
        })
    }

    /// Depth-first search for a choice with the given id anywhere below this node.
    ///
    /// An empty id never matches.
    pub fn find_by_id(&self, id: &str) -> Option<&Choice> {
        if id.is_empty() {
            return None;
        }

        for item in &self.items {
            if item.id == id {
                return Some(item);
            }
            if let Some(found) = item.child().and_then(|child| child.find_by_id(id)) {
                return Some(found);
            }
        }
        None
    }

    /// Pre-order list of every choice below this node, branches included
    pub fn flatten(&self) -> Vec<&Choice> {
        let mut all = Vec::new();
        self.collect_into(&mut all);
        all
    }

    fn collect_into<'a>(&'a self, all: &mut Vec<&'a Choice>) {
        for item in &self.items {
            all.push(item);
            if let Some(child) = item.child() {
                child.collect_into(all);
            }
        }
    }
}

impl Catalogue {
    pub fn new(title: impl Into<String>, root: MenuNode) -> Self {
        Self {
            title: title.into(),
            root,
        }
    }

    /// Parse and validate a catalogue from its JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCatalogue =
            serde_json::from_str(json).context("Failed to parse menu document")?;
        let root = MenuNode::from_raw(raw.entry)?;
        let catalogue = Self::new(raw.title, root);
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Choice> {
        self.root.find_by_id(id)
    }

    pub fn flatten(&self) -> Vec<&Choice> {
        self.root.flatten()
    }

    /// Check the invariants lookups depend on: ids are non-empty, unique across
    /// the whole tree and usable inside a tagged button payload.
    pub fn validate(&self) -> Result<(), MenuError> {
        if self.root.items.is_empty() {
            return Err(MenuError::EmptyRoot);
        }

        let mut seen = HashSet::new();
        for choice in self.flatten() {
            if choice.id.is_empty() {
                return Err(MenuError::EmptyId);
            }
            if choice.id.contains(SEPARATOR) {
                return Err(MenuError::ReservedSeparator(choice.id.clone()));
            }
            if choice.id.len() > MAX_ID_LEN {
                return Err(MenuError::IdTooLong(choice.id.clone()));
            }
            if !seen.insert(choice.id.as_str()) {
                return Err(MenuError::DuplicateId(choice.id.clone()));
            }
            match &choice.kind {
                ChoiceKind::Leaf { price } if *price <= Decimal::ZERO => {
                    return Err(MenuError::NonPositivePrice(choice.id.clone()));
                }
                ChoiceKind::Branch { child } if child.items.is_empty() => {
                    return Err(MenuError::EmptyBranch(choice.id.clone()));
                }
                ChoiceKind::Branch { child } if child.question.trim().is_empty() => {
                    return Err(MenuError::MissingQuestion(choice.id.clone()));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Load the catalogue from a JSON file
pub fn load_catalogue(path: impl AsRef<Path>) -> Result<Catalogue> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read menu file {}", path.display()))?;
    let catalogue = Catalogue::from_json(&content)
        .with_context(|| format!("Invalid menu file {}", path.display()))?;

    info!(
        path = %path.display(),
        title = %catalogue.title,
        top_level = catalogue.root.items.len(),
        total = catalogue.flatten().len(),
        "Menu loaded"
    );
    Ok(catalogue)
}
