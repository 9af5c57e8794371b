//! storyflow runtime
//!
//! This binary wires the pipeline together:
//! - Opens the SQLite story store (schema applied on open)
//! - Starts the ingestion scheduler
//! - Serves the HTTP API and live update socket on one listener
//!
//! Usage:
//!   JWT_SECRET=... cargo run --release --bin storyflow
//!
//! Environment variables:
//!   JWT_SECRET - Token signing secret (required)
//!   STORYFLOW_DB_PATH - SQLite database path (default: data/storyflow.db)
//!   PORT - Listening port (default: 3000)
//!   INGEST_INTERVAL_MS - Ingestion period (default: 300000)
//!   CACHE_TTL_MS - Page cache TTL (default: 300000)
//!   FETCH_BATCH_SIZE - Candidate ids per cycle (default: 10)
//!
//! Exits with status 1 if startup fails.

use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;
use storyflow::pipeline::{
    AppContext, HackerNewsClient, IngestionScheduler, PipelineConfig, SqliteStoryStore,
    StoryStore, TokenAuthority,
};
use storyflow::server::{build_router, shutdown_signal};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("❌ Failed to start server: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("🚀 storyflow v{}", env!("CARGO_PKG_VERSION"));

    let config = PipelineConfig::from_env()?;
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Source: {}", config.source_base_url);
    info!("   ├─ Batch size: {}", config.fetch_batch_size);
    info!("   ├─ Ingest interval: {}ms", config.ingest_interval_ms);
    info!("   ├─ Cache TTL: {}ms", config.cache_ttl_ms);
    info!("   └─ Fetch timeout: {}ms", config.fetch_timeout_ms);

    info!("🔧 Initializing database...");
    let store: Arc<dyn StoryStore> = Arc::new(SqliteStoryStore::open(&config.db_path)?);
    info!("✅ Database initialized");

    let auth = TokenAuthority::new(
        &config.jwt_secret,
        std::time::Duration::from_secs(config.token_ttl_secs),
        &config.admin_username,
        &config.admin_password,
    )?;
    let ctx = Arc::new(AppContext::new(store.clone(), config.cache_ttl(), auth));

    let source = Arc::new(HackerNewsClient::new(
        &config.source_base_url,
        config.fetch_batch_size,
        config.fetch_timeout(),
    )?);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    info!("✅ Server running on http://{}", listener.local_addr()?);

    let scheduler = IngestionScheduler::new(
        source,
        store,
        ctx.notifier.clone(),
        config.fetch_timeout(),
    );
    scheduler.start(config.ingest_interval());

    let app = build_router(ctx);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("🛑 Stopping scheduler (waiting for in-flight cycle)...");
    scheduler.stop().await;

    let stats = scheduler.stats();
    info!(
        "✅ storyflow stopped: {} cycles run, {} skipped, {} stories ingested",
        stats.cycles_completed, stats.cycles_skipped, stats.items_inserted
    );

    served?;
    Ok(())
}
