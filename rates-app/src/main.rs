//! # Rates Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the store adapter and the feed client
//! - Start the scheduler (one pass at startup, then every interval)
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rates_feed::HttpFeedClient;
use rates_hex::{QueryService, Scheduler, UpdateCycle, inbound::HttpServer};
use rates_repo::build_store;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,rates_server=debug,rates_hex=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = config::Config::from_env()?;
    init_tracing(config.json_logs);

    tracing::info!("Starting rates server on port {}", config.port);
    tracing::info!("Using store: {}", config.database_url);
    // Build store (handles connection and migration)
    let store = Arc::new(build_store(&config.database_url).await?);
    tracing::info!(kind = store.kind(), "Store ready");
    let feed = HttpFeedClient::new(&config.feed_url, config.feed_timeout)?;
    tracing::info!("Using feed: {}", feed.url());

    // The scheduler runs its first pass before the timer starts
    let scheduler = Scheduler::new(UpdateCycle::new(feed, store.clone()), config.update_interval);
    let refresher = Arc::new(scheduler.handle());
    tokio::spawn(scheduler.run());

    let query = QueryService::new(store, config.base_currency)
        .with_listed(config.listed_currencies);

    let server = HttpServer::new(query)
        .with_rate_limit(config.rate_limit_per_minute)
        .with_refresher(refresher);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    Ok(())
}
