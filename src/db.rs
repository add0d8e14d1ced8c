//! Postgres storage for orders and order watchers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::Row;
use std::sync::Arc;
use teloxide::types::{ChatId, UserId};
use tracing::{error, info};

use crate::order::{OrderRecord, OrderStore, Watcher, WatcherRegistry};

/// A stored order as read back from the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub chat_id: i64,
    pub beverage_id: String,
    pub price: Decimal,
    pub placed_at: DateTime<Utc>,
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS coffee_orders (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL,
            user_name TEXT NOT NULL,
            chat_id BIGINT NOT NULL,
            beverage_id TEXT NOT NULL,
            price NUMERIC(10, 2) NOT NULL CHECK (price > 0),
            placed_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create coffee_orders table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS coffee_orders_user_idx ON coffee_orders (user_id)")
        .execute(pool)
        .await
        .context("Failed to create coffee_orders index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS coffee_watchers (
            user_id BIGINT PRIMARY KEY,
            chat_id BIGINT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create coffee_watchers table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

// Telegram user ids fit in 52 bits, so the cast to BIGINT is lossless
fn user_id_to_db(user_id: UserId) -> i64 {
    user_id.0 as i64
}

/// Insert an order, returning its row id
pub async fn insert_order(pool: &PgPool, order: &OrderRecord) -> Result<i64> {
    let row = sqlx::query(
        "INSERT INTO coffee_orders (user_id, user_name, chat_id, beverage_id, price, placed_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(user_id_to_db(order.user_id))
    .bind(&order.user_name)
    .bind(order.chat_id.0)
    .bind(&order.beverage_id)
    .bind(order.price)
    .bind(order.placed_at)
    .fetch_one(pool)
    .await
    .context("Failed to insert order")?;

    Ok(row.try_get("id")?)
}

/// All orders placed by a user, newest first
pub async fn orders_for_user(pool: &PgPool, user_id: UserId) -> Result<Vec<StoredOrder>> {
    let rows = sqlx::query(
        "SELECT id, user_id, user_name, chat_id, beverage_id, price, placed_at
         FROM coffee_orders
         WHERE user_id = $1
         ORDER BY placed_at DESC, id DESC",
    )
    .bind(user_id_to_db(user_id))
    .fetch_all(pool)
    .await
    .context("Failed to read orders")?;

    rows.iter()
        .map(|row| -> Result<StoredOrder> {
            Ok(StoredOrder {
                id: row.try_get("id")?,
                user_id: row.try_get("user_id")?,
                user_name: row.try_get("user_name")?,
                chat_id: row.try_get("chat_id")?,
                beverage_id: row.try_get("beverage_id")?,
                price: row.try_get("price")?,
                placed_at: row.try_get("placed_at")?,
            })
        })
        .collect()
}

/// Register (or move) a watcher. Returns `true` when the user was not watching before.
pub async fn add_watcher(pool: &PgPool, watcher: Watcher) -> Result<bool> {
    let row = sqlx::query(
        "INSERT INTO coffee_watchers (user_id, chat_id)
         VALUES ($1, $2)
         ON CONFLICT (user_id) DO UPDATE SET chat_id = EXCLUDED.chat_id
         RETURNING (xmax = 0) AS inserted",
    )
    .bind(user_id_to_db(watcher.user_id))
    .bind(watcher.chat_id.0)
    .fetch_one(pool)
    .await
    .context("Failed to add watcher")?;

    Ok(row.try_get("inserted")?)
}

/// Returns `true` when the user was watching
pub async fn remove_watcher(pool: &PgPool, user_id: UserId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM coffee_watchers WHERE user_id = $1")
        .bind(user_id_to_db(user_id))
        .execute(pool)
        .await
        .context("Failed to remove watcher")?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_watchers(pool: &PgPool) -> Result<Vec<Watcher>> {
    let rows = sqlx::query("SELECT user_id, chat_id FROM coffee_watchers ORDER BY created_at")
        .fetch_all(pool)
        .await
        .context("Failed to list watchers")?;

    rows.iter()
        .map(|row| -> Result<Watcher> {
            let user_id: i64 = row.try_get("user_id")?;
            let chat_id: i64 = row.try_get("chat_id")?;
            Ok(Watcher {
                user_id: UserId(user_id as u64),
                chat_id: ChatId(chat_id),
            })
        })
        .collect()
}

/// [`OrderStore`] backed by the `coffee_orders` table
pub struct PgOrderStore {
    pool: Arc<PgPool>,
}

impl PgOrderStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn place_order(&self, order: &OrderRecord) -> bool {
        match insert_order(&self.pool, order).await {
            Ok(id) => {
                info!(order_id = id, user_id = %order.user_id, "Order stored");
                true
            }
            Err(e) => {
                error!(user_id = %order.user_id, error = %e, "Failed to store order");
                false
            }
        }
    }
}

/// [`WatcherRegistry`] backed by the `coffee_watchers` table
pub struct PgWatcherRegistry {
    pool: Arc<PgPool>,
}

impl PgWatcherRegistry {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn add(&self, watcher: Watcher) -> Result<bool> {
        add_watcher(&self.pool, watcher).await
    }

    pub async fn remove(&self, user_id: UserId) -> Result<bool> {
        remove_watcher(&self.pool, user_id).await
    }
}

#[async_trait]
impl WatcherRegistry for PgWatcherRegistry {
    async fn list_watchers(&self) -> Result<Vec<Watcher>> {
        list_watchers(&self.pool).await
    }
}
