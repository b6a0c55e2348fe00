//! Company quote sync job.
//!
//! Fetches share price and market cap for every company with a symbol and
//! writes them to the database.

use anyhow::Context;
use fundamentals_dashboard_backend::config::Config;
use fundamentals_dashboard_backend::db::{self, DatabasePool};
use fundamentals_dashboard_backend::sync::{QuoteClient, run_sync};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::from_env_and_file(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    let db = DatabasePool::new(&config.database)
        .await
        .context("connecting to database")?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    info!("Fetching companies with symbols...");
    let companies = db::load_syncable_companies(db.pool()).await?;
    info!("Found {} companies with symbols", companies.len());

    let client = QuoteClient::new(&config.sync.quote_url, config.sync.request_timeout())?
        .with_session(&config.sync.cookie_url, &config.sync.crumb_url);
    let report = run_sync(
        &client,
        &db,
        companies,
        &config.sync.symbol_suffix,
        config.sync.concurrency,
    )
    .await;
    report.log_summary();

    Ok(())
}
