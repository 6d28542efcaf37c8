//! Exrate Service Binary
//!
//! Keeps exchange rates fresh for every registered currency: connects the
//! rate core to PostgreSQL and the remote provider, then drives the
//! scheduled refresh loop until shutdown.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exrate_fx::{RateCache, RateRefresher, RefreshScheduler};
use exrate_provider::OpenExchangeRatesClient;
use exrate_service::ServiceConfig;
use exrate_store::{migrations, PgCurrencyRegistry, PgRateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting exrate service");

    // Load configuration
    let config = ServiceConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let instance_id = format!("exrate-{}", uuid::Uuid::new_v4());
    info!(instance_id = %instance_id, "Instance ID assigned");

    // Database pool and schema
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await?;
    migrations::run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;

    // Collaborators
    let registry = Arc::new(PgCurrencyRegistry::new(pool.clone()));
    let store = Arc::new(PgRateStore::new(pool));
    let fetcher = Arc::new(
        OpenExchangeRatesClient::new(config.provider.clone())
            .map_err(|e| anyhow::anyhow!("Provider client error: {}", e))?,
    );
    let cache = Arc::new(RateCache::new());

    let refresher = Arc::new(RateRefresher::new(
        registry.clone(),
        fetcher,
        store,
        cache,
        config.refresh.clone(),
    ));
    let scheduler = Arc::new(RefreshScheduler::new(
        registry,
        refresher,
        config.scheduler.clone(),
    ));

    // Run the refresh loop until shutdown. The first cycle fires
    // immediately, priming the cache at startup.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    info!(
        instance_id = %instance_id,
        interval = ?config.scheduler.interval,
        "Service running"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    scheduler_task.await?;

    info!("Service shutdown complete");
    Ok(())
}
