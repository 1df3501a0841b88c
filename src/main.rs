use std::sync::Arc;

use tracing::info;

use saferide_dispatch::config::AppConfig;
use saferide_dispatch::{db, kafka};
use saferide_dispatch::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting SafeRide dispatch service...");

    // Init DB
    let pool = db::init_pool(&config.database_url).await?;
    info!("Connected to database");

    // Start the location-ping consumer
    let store = Arc::new(PgStore::new(pool));
    kafka::start_ping_consumer(&config, store).await?;

    Ok(())
}
