use anyhow::{Result, bail};
use lotto_ingest::api::{HttpLotterySource, fetch_and_save_games};
use lotto_ingest::connection::conn;
use lotto_ingest::database::{count_games, test_connection};
use lotto_ingest::{cancel, config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db_conn = conn(&config.database_url).inspect_err(|e| {
        error!("Failed to open database: {:?}", e);
    })?;
    if !test_connection(&db_conn) {
        bail!("database at {} is not reachable", config.database_url);
    }
    info!("Database connection successful...");

    let (cancel_handle, cancel_signal) = cancel::pair();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        cancel_handle.cancel();
    });

    let source = HttpLotterySource::new(config.api_url.clone());

    let summary = fetch_and_save_games(&db_conn, &source, config.extract_mode, &cancel_signal)
        .await
        .inspect_err(|e| {
            error!("❌ Ingestion failed: {:?}", e);
        })?;

    info!(
        "🎯 Run complete: {} fetched, {} inserted, {} already stored, {} games in database",
        summary.fetched,
        summary.inserted,
        summary.already_stored,
        count_games(&db_conn)?
    );

    Ok(())
}
