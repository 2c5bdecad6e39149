/// updater.rs — Price/PnL refresh for tracked positions
///
/// Sweeps the distinct symbols across the entry and exit tables once per
/// tick. A failed price fetch leaves that symbol's rows stale and moves on;
/// one bad symbol never aborts the sweep.
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::feed::PriceFeed;
use crate::ledger::PositionLedger;
use crate::models::Side;

/// Unrealized PnL in percent. A price increase benefits LONG, a price
/// decrease benefits SHORT. A non-positive entry price forces 0 (the source
/// data occasionally carried placeholder rows).
pub fn pnl_pct(side: Side, entry: f64, current: f64) -> f64 {
    if entry <= 0.0 {
        return 0.0;
    }
    let raw = (current / entry - 1.0) * 100.0;
    match side {
        Side::Long => raw,
        Side::Short => -raw,
    }
}

/// Refresh `current_price`/`pnl_pct` for every tracked symbol in both
/// ledgers. Returns how many symbols were updated.
pub async fn refresh_positions<F: PriceFeed>(
    feed: &F,
    positions: &PositionLedger,
) -> Result<usize, StorageError> {
    let entries = positions.list_all()?;
    let exits = positions.list_exits()?;

    // Symbol -> (side, entry price). Exit-only rows (entries pruned
    // externally) still get refreshed; entries are appended in time order,
    // so the forward pass leaves the newest entry row in the slot.
    let mut tracked: Vec<(String, Side, f64)> = Vec::new();
    for rec in exits.iter() {
        if !tracked.iter().any(|(s, _, _)| s == &rec.symbol) {
            tracked.push((rec.symbol.clone(), rec.side, rec.entry));
        }
    }
    for rec in entries.iter() {
        match tracked.iter_mut().find(|(s, _, _)| s == &rec.symbol) {
            Some(slot) => {
                slot.1 = rec.side;
                slot.2 = rec.entry;
            }
            None => tracked.push((rec.symbol.clone(), rec.side, rec.entry)),
        }
    }

    let mut updated = 0;
    for (symbol, side, entry) in tracked {
        let price = match feed.last_price(&symbol).await {
            Ok(p) => p,
            Err(e) => {
                warn!("Price refresh failed for {symbol}: {e} (leaving rows stale)");
                continue;
            }
        };
        let pnl = pnl_pct(side, entry, price);
        positions.update_by_symbol(&symbol, price, pnl)?;
        debug!("Refreshed {symbol}: price={price:.4} pnl={pnl:.2}%");
        updated += 1;
    }
    Ok(updated)
}
