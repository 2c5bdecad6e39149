/// main.rs — Worker entry point
///
/// FLOW:
///   1. Load config from .env
///   2. Open the SQLite store (schema bootstraps on open)
///   3. Probe storage and feed availability once
///   4. Warm the dedup ledger from the signals table
///   5. Tick every TICK_INTERVAL_SECS until ctrl-c
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use autotrader_engine::config::AppConfig;
use autotrader_engine::feed::BinanceFeed;
use autotrader_engine::notify::LogNotifier;
use autotrader_engine::sqlite::SqliteStore;
use autotrader_engine::storage::TableStore;
use autotrader_engine::worker::{Capabilities, Worker};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════╗");
    info!("║     AUTOTRADER ENGINE  —  SIGNAL WORKER      ║");
    info!("╚══════════════════════════════════════════════╝");

    let cfg = AppConfig::from_env()?;
    info!(
        "Universe fallback: {:?}  tick={}s  auto_engine={}  notifications={}",
        cfg.symbols, cfg.tick_secs, cfg.auto_engine, cfg.notifications
    );

    let store: Arc<dyn TableStore> = Arc::new(SqliteStore::open(&cfg.db_path)?);
    let feed = BinanceFeed::new(&cfg.rest_url, cfg.http_timeout_secs, cfg.feed_retries)?;

    let probe_symbol = cfg.symbols.first().cloned().unwrap_or_else(|| "BTCUSDT".into());
    let caps = Capabilities::detect(store.as_ref(), &feed, &probe_symbol).await;
    if !caps.storage {
        anyhow::bail!("Storage backend unavailable at startup, refusing to run");
    }
    if !caps.feed {
        warn!("Price feed unreachable at startup; ticks will retry per call");
    }

    let mut worker = Worker::new(cfg, feed, LogNotifier, store)?;
    worker.run().await
}
