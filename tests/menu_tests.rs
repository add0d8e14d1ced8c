//! # Menu Tests
//!
//! Loading the shipped catalogue and checking tree lookups against it.

use anyhow::Result;
use coffee_bot::errors::MenuError;
use coffee_bot::menu::{load_catalogue, Catalogue};
use std::io::Write;
use tempfile::NamedTempFile;

const MENU_PATH: &str = "./data/benugo.json";

fn write_menu(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_shipped_menu() -> Result<()> {
    let menu = load_catalogue(MENU_PATH)?;

    assert!(menu.title.starts_with("Benugo"), "wrong title: {}", menu.title);

    // Sub-menus contribute extra entries
    let size = menu.root.items.len();
    let all = menu.flatten();
    assert!(all.len() > size, "all: {}, top level: {}", all.len(), size);
    Ok(())
}

#[test]
fn test_find_first_and_last_drink() -> Result<()> {
    let menu = load_catalogue(MENU_PATH)?;
    let all = menu.flatten();

    let first = menu.find_by_id(&all[0].id).expect("first drink");
    assert_eq!(first.id, all[0].id);

    let last = menu.find_by_id(&all[all.len() - 1].id).expect("last drink");
    assert_eq!(last.id, all[all.len() - 1].id);

    assert!(menu.find_by_id("").is_none());
    Ok(())
}

#[test]
fn test_every_id_round_trips() -> Result<()> {
    let menu = load_catalogue(MENU_PATH)?;
    for choice in menu.flatten() {
        assert_eq!(menu.find_by_id(&choice.id).map(|c| &c.id), Some(&choice.id));
    }
    Ok(())
}

#[test]
fn test_nested_branch_is_reachable() -> Result<()> {
    let menu = load_catalogue(MENU_PATH)?;

    let herbal = menu.find_by_id("Herbal").expect("Herbal branch");
    assert!(!herbal.is_leaf());
    assert_eq!(herbal.child().unwrap().question, "Which infusion?");

    let peppermint = menu.find_by_id("Peppermint").expect("Peppermint");
    assert!(peppermint.is_leaf());
    assert!(peppermint.price().is_some());
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let err = load_catalogue("./data/no-such-menu.json").unwrap_err();
    assert!(err.to_string().contains("no-such-menu.json"));
}

#[test]
fn test_malformed_json_is_an_error() {
    let file = write_menu("{ \"title\": \"Broken\", ");
    assert!(load_catalogue(file.path()).is_err());
}

#[test]
fn test_duplicate_ids_across_levels_rejected() {
    let file = write_menu(
        r#"{
            "title": "Dupes",
            "entry": {
                "question": "Pick",
                "items": [
                    { "id": "Mocha", "display": "Mocha", "price": 3.1 },
                    { "id": "Specials", "display": "Specials", "entry": {
                        "question": "Which special?",
                        "items": [{ "id": "Mocha", "display": "Mocha again", "price": 3.5 }]
                    }}
                ]
            }
        }"#,
    );

    let err = load_catalogue(file.path()).unwrap_err();
    let menu_error = err.chain().find_map(|e| e.downcast_ref::<MenuError>());
    assert_eq!(menu_error, Some(&MenuError::DuplicateId("Mocha".to_string())));
}

#[test]
fn test_non_positive_price_rejected() {
    let json = r#"{"title": "Free", "entry": {"question": "Q", "items": [
        {"id": "Water", "display": "Water", "price": 0}
    ]}}"#;
    let err = Catalogue::from_json(json).unwrap_err();
    assert_eq!(
        err.downcast_ref::<MenuError>(),
        Some(&MenuError::NonPositivePrice("Water".to_string()))
    );
}
