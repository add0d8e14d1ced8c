//! # Coffee Telegram Bot
//!
//! A Telegram bot that walks users through a drink menu with inline buttons,
//! asks them to confirm their choice, stores the order and tells everyone
//! watching orders about it.

pub mod bot;
pub mod callback;
pub mod config;
pub mod conversation;
pub mod conversation_registry;
pub mod db;
pub mod errors;
pub mod keyboard;
pub mod localization;
pub mod menu;
pub mod order;
