use anyhow::Result;
use pricebot::{bot::schema, config::Config, store::Store};
use reqwest::Client;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) environment + logging ────────────────────────────────────
    dotenvy::dotenv().ok();
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) configuration, fail fast without a token ─────────────────
    let config = Config::from_env()?;

    // ─── 3) shared handles: store, scraping client, bot ──────────────
    let store = Arc::new(Store::open(&config.database_path)?);
    let client = Client::new();
    let bot = Bot::new(&config.telegram_token);

    // drop any stale webhook so long polling receives the updates
    bot.delete_webhook().drop_pending_updates(true).await?;
    info!(database = %config.database_path, "startup");

    // ─── 4) dispatch until ctrl-c ────────────────────────────────────
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![store, client])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
