//! Order records and the finalization step run on CONFIRM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use teloxide::types::{ChatId, UserId};
use tracing::{error, info, warn};

use crate::conversation::ChatTransport;
use crate::localization::t_args;

/// A confirmed drink order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub user_id: UserId,
    pub user_name: String,
    pub chat_id: ChatId,
    pub beverage_id: String,
    pub price: Decimal,
    pub placed_at: DateTime<Utc>,
}

/// A party notified about other people's orders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watcher {
    pub user_id: UserId,
    pub chat_id: ChatId,
}

/// Durable order storage
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist the order, `false` when it could not be stored
    async fn place_order(&self, order: &OrderRecord) -> bool;
}

/// Source of the parties to notify about new orders
#[async_trait]
pub trait WatcherRegistry: Send + Sync {
    async fn list_watchers(&self) -> anyhow::Result<Vec<Watcher>>;
}

/// Two decimal places, the way prices are shown to users
pub fn format_price(price: Decimal) -> String {
    format!("{:.2}", price)
}

/// One-line summary sent to watchers: `user: drink @ £price`
pub fn watcher_summary(order: &OrderRecord) -> String {
    t_args(
        "order-watcher-summary",
        &[
            ("user", &order.user_name),
            ("drink", &order.beverage_id),
            ("price", &format_price(order.price)),
        ],
    )
}

/// Stores confirmed orders and tells every other watcher about them
pub struct OrderFinalizer {
    store: Arc<dyn OrderStore>,
    watchers: Arc<dyn WatcherRegistry>,
    transport: Arc<dyn ChatTransport>,
}

impl OrderFinalizer {
    pub fn new(
        store: Arc<dyn OrderStore>,
        watchers: Arc<dyn WatcherRegistry>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            store,
            watchers,
            transport,
        }
    }

    /// Persist the order and, when that worked, broadcast it to the watchers.
    ///
    /// Failed watcher notifications do not affect the result.
    pub async fn finalize(&self, order: &OrderRecord) -> bool {
        if !self.store.place_order(order).await {
            error!(
                user_id = %order.user_id,
                beverage = %order.beverage_id,
                "Failed to place order"
            );
            return false;
        }

        info!(
            user_id = %order.user_id,
            chat_id = %order.chat_id,
            beverage = %order.beverage_id,
            price = %order.price,
            "Order placed"
        );

        let notified = self.broadcast(order).await;
        info!(user_id = %order.user_id, notified, "Order broadcast to watchers");
        true
    }

    /// Send the order summary to every watcher except the one who ordered.
    /// Returns how many notifications went out.
    pub async fn broadcast(&self, order: &OrderRecord) -> usize {
        let watchers = match self.watchers.list_watchers().await {
            Ok(watchers) => watchers,
            Err(e) => {
                error!(error = %e, "Failed to list watchers");
                return 0;
            }
        };

        let summary = watcher_summary(order);
        let mut notified = 0;
        for watcher in watchers.iter().filter(|w| w.user_id != order.user_id) {
            match self.transport.notify(watcher.chat_id, &summary).await {
                Ok(()) => notified += 1,
                Err(e) => warn!(
                    watcher = %watcher.user_id,
                    chat_id = %watcher.chat_id,
                    error = %e,
                    "Failed to notify watcher"
                ),
            }
        }
        notified
    }
}
