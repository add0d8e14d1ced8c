use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coffee_bot::bot::{self, AppState, TelegramTransport};
use coffee_bot::config::{BotConfig, LogFormat};
use coffee_bot::conversation::{ChatTransport, Services};
use coffee_bot::conversation_registry::ConversationRegistry;
use coffee_bot::db::{self, PgOrderStore, PgWatcherRegistry};
use coffee_bot::localization::init_localization;
use coffee_bot::menu::load_catalogue;
use coffee_bot::order::OrderFinalizer;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Coffee Telegram Bot");

    init_localization()?;

    // A broken menu is fatal: nothing can be ordered without it
    let catalogue = Arc::new(load_catalogue(&config.menu_path)?);

    info!("Connecting to database");
    let pool = PgPoolOptions::new()
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    db::init_database_schema(&pool).await?;
    let pool = Arc::new(pool);

    let telegram = Bot::new(&config.bot_token);

    let transport: Arc<dyn ChatTransport> = Arc::new(TelegramTransport::new(telegram.clone()));
    let watchers = Arc::new(PgWatcherRegistry::new(Arc::clone(&pool)));
    let finalizer = Arc::new(OrderFinalizer::new(
        Arc::new(PgOrderStore::new(Arc::clone(&pool))),
        watchers.clone(),
        Arc::clone(&transport),
    ));

    let registry = Arc::new(ConversationRegistry::new(config.conversation_ttl));
    tokio::spawn(Arc::clone(&registry).run_pruner(config.prune_interval));

    let app = Arc::new(AppState {
        services: Services {
            catalogue,
            transport,
            finalizer,
        },
        registry,
        watchers,
    });

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(telegram, bot::schema())
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
