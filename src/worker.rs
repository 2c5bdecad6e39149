/// worker.rs — Tick scheduler driving the signal engine
///
/// One tick per interval: refresh prices for tracked positions, then (when
/// the auto engine is enabled) scan the (mode/timeframe, symbol) matrix for
/// fresh breakouts, and finally hand new signals to the notifier. Ticks run
/// inside a single awaited loop body, so two ticks can never overlap; a tick
/// that overruns its interval makes the scheduler skip the missed slot
/// instead of bunching up.
use std::sync::Arc;

use anyhow::Result;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::detector;
use crate::feed::PriceFeed;
use crate::indicators;
use crate::ledger::{DedupLedger, PositionLedger};
use crate::models::{Mode, Signal};
use crate::notify::Notifier;
use crate::storage::{Table, TableStore};
use crate::universe;
use crate::updater;

/// Typed availability of the external collaborators, probed once before the
/// tick loop instead of the source's exception-driven "is it configured"
/// checks.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub storage: bool,
    pub feed: bool,
}

impl Capabilities {
    pub async fn detect<F: PriceFeed>(
        store: &dyn TableStore,
        feed: &F,
        probe_symbol: &str,
    ) -> Self {
        let storage = match store.read_table(Table::Coins) {
            Ok(_) => true,
            Err(e) => {
                error!("Storage probe failed: {e}");
                false
            }
        };
        let feed = match feed.last_price(probe_symbol).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Feed probe failed for {probe_symbol}: {e}");
                false
            }
        };
        Self { storage, feed }
    }
}

pub struct Worker<F, N> {
    cfg: AppConfig,
    feed: F,
    notifier: N,
    store: Arc<dyn TableStore>,
    dedup: DedupLedger,
    positions: PositionLedger,
}

impl<F: PriceFeed, N: Notifier> Worker<F, N> {
    pub fn new(
        cfg: AppConfig,
        feed: F,
        notifier: N,
        store: Arc<dyn TableStore>,
    ) -> Result<Self> {
        let dedup = DedupLedger::load(store.clone())?;
        let positions = PositionLedger::new(store.clone());
        info!("Dedup ledger warmed with {} known signal ids", dedup.len());
        Ok(Self {
            cfg,
            feed,
            notifier,
            store,
            dedup,
            positions,
        })
    }

    /// Run until a termination signal arrives. The in-flight tick always
    /// completes before the loop exits.
    pub async fn run(&mut self) -> Result<()> {
        let mut ticker = interval(Duration::from_secs(self.cfg.tick_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Entering tick loop (every {}s)...", self.cfg.tick_secs);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping worker");
                    return Ok(());
                }
            }
        }
    }

    /// One scheduler tick. Returns the signals created during this tick
    /// (already persisted and mirrored into the position ledger).
    pub async fn tick(&mut self) -> Vec<Signal> {
        // 1. Price/PnL refresh always runs first
        match updater::refresh_positions(&self.feed, &self.positions).await {
            Ok(n) if n > 0 => info!("Refreshed {n} tracked symbols"),
            Ok(_) => {}
            Err(e) => warn!("Position refresh write failed, retrying next tick: {e}"),
        }

        // 2. Signal generation across the (mode/timeframe, symbol) matrix
        let mut new_signals = Vec::new();
        if self.cfg.auto_engine {
            let universe = self.universe();
            for (mode, timeframe) in self.cfg.mode_matrix() {
                for symbol in &universe {
                    match self.scan(symbol, mode, &timeframe).await {
                        Ok(Some(signal)) => new_signals.push(signal),
                        Ok(None) => {}
                        // Per-symbol isolation: log and move on
                        Err(e) => warn!("Scan failed for {symbol} {timeframe}: {e}"),
                    }
                }
            }
        }

        // 3. Best-effort notification
        if self.cfg.notifications && !new_signals.is_empty() {
            if let Err(e) = self.notifier.notify(&new_signals) {
                warn!("Notification failed (ignored): {e}");
            }
        }
        new_signals
    }

    /// Fetch bars, compute indicators, evaluate the breakout rule, and on a
    /// fresh signal persist it plus its entry/exit records.
    async fn scan(&mut self, symbol: &str, mode: Mode, timeframe: &str) -> Result<Option<Signal>> {
        let bars = self
            .feed
            .fetch_ohlcv(symbol, timeframe, self.cfg.ohlcv_limit)
            .await?;
        // The most recent bar may still be forming; decide on closed bars only
        let closed = if bars.is_empty() {
            &bars[..]
        } else {
            &bars[..bars.len() - 1]
        };
        let snaps = indicators::compute(closed, self.cfg.indicator_params());
        if snaps.len() < 2 {
            return Ok(None); // insufficient data is not an error
        }
        let prev = &snaps[snaps.len() - 2];
        let last = &snaps[snaps.len() - 1];
        let Some(signal) = detector::evaluate(symbol, mode, timeframe, prev, last) else {
            return Ok(None);
        };

        if !self.dedup.try_register(&signal)? {
            // Expected on every re-observation of the same bar; stay silent
            return Ok(None);
        }
        self.positions.append_entry(&signal)?;
        self.positions.append_exit_mirror(&signal)?;
        info!(
            "NEW SIGNAL {} {} {} entry={:.4} target={:.4} atr={:.4}",
            signal.side, signal.symbol, signal.mode, signal.entry_price, signal.target_price,
            signal.atr
        );
        Ok(Some(signal))
    }

    /// Active universe from the coins table, falling back to the configured
    /// pair list when the table is empty or unreadable. A table where every
    /// coin is paused scans nothing.
    fn universe(&self) -> Vec<String> {
        match universe::list_all(self.store.as_ref()) {
            Ok(coins) if !coins.is_empty() => coins
                .into_iter()
                .filter(|c| c.active)
                .map(|c| c.symbol)
                .collect(),
            Ok(_) => self.cfg.symbols.clone(),
            Err(e) => {
                warn!("Coins table unreadable, using configured universe: {e}");
                self.cfg.symbols.clone()
            }
        }
    }

    pub fn positions(&self) -> &PositionLedger {
        &self.positions
    }

    pub fn dedup(&self) -> &DedupLedger {
        &self.dedup
    }
}
