/// models.rs — Domain types shared across the engine
///
/// A `Signal` is the output of the breakout detector; the `*Record` structs
/// mirror the logical persistence tables one-to-one and are what actually
/// crosses the storage interface (as JSON rows).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const STATUS_NEW: &str = "NEW";
pub const STATUS_OPEN: &str = "OPEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "LONG")]
    Long,
    #[serde(rename = "SHORT")]
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trading mode. Swing runs on an intraday timeframe, Positional on a daily
/// one; each mode scans the same universe independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "SWING")]
    Swing,
    #[serde(rename = "POSITIONAL")]
    Positional,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Swing => "SWING",
            Mode::Positional => "POSITIONAL",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLCV sample for a fixed timeframe. Produced by the price feed,
/// consumed read-only by the indicator engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Stable bar identifier: open time at minute granularity plus the timeframe.
/// Reprocessing the same closed bar always reproduces the same id.
pub fn bar_id(open_time: DateTime<Utc>, timeframe: &str) -> String {
    format!("{}|{}", open_time.format("%Y-%m-%dT%H:%M"), timeframe)
}

/// Content-addressed signal identifier: truncated hex SHA-256 over the
/// deduplication tuple. Two scans of the same breakout collide by design.
pub fn signal_id(symbol: &str, mode: Mode, side: Side, bar_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{symbol}|{mode}|{side}|{bar_id}").as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_owned()
}

/// A deduplicated breakout signal, ready to be persisted and tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub mode: Mode,
    pub side: Side,
    pub bar_id: String,
    pub entry_price: f64,
    pub target_price: f64,
    pub atr: f64,
    pub upper: f64,
    pub lower: f64,
    pub generated_at: DateTime<Utc>,
    pub signal_id: String,
}

// ── Persisted rows ────────────────────────────────────────────────────────

/// Row of the `signals` table (the dedup ledger's backing store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub signal_id: String,
    pub symbol: String,
    pub mode: Mode,
    pub side: Side,
    pub bar_time: String,
    pub price: f64,
    pub atr: f64,
    pub upper: f64,
    pub lower: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&Signal> for SignalRecord {
    fn from(s: &Signal) -> Self {
        Self {
            signal_id: s.signal_id.clone(),
            symbol: s.symbol.clone(),
            mode: s.mode,
            side: s.side,
            bar_time: s.bar_id.clone(),
            price: s.entry_price,
            atr: s.atr,
            upper: s.upper,
            lower: s.lower,
            timestamp: s.generated_at,
        }
    }
}

/// Row of the `entries` table: a tracked position as first recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub symbol: String,
    pub side: Side,
    pub mode: Mode,
    pub entry: f64,
    pub target: f64,
    pub current_price: f64,
    pub pnl_pct: f64,
    pub status: String,
    pub date: String,
    pub time: String,
}

impl EntryRecord {
    pub fn from_signal(s: &Signal) -> Self {
        Self {
            symbol: s.symbol.clone(),
            side: s.side,
            mode: s.mode,
            entry: s.entry_price,
            target: s.target_price,
            current_price: s.entry_price,
            pnl_pct: 0.0,
            status: STATUS_NEW.to_owned(),
            date: s.generated_at.format("%Y-%m-%d").to_string(),
            time: s.generated_at.format("%H:%M:%S").to_string(),
        }
    }
}

/// Row of the `exits` table: the monitoring mirror of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub symbol: String,
    pub side: Side,
    pub mode: Mode,
    pub entry: f64,
    pub current_price: f64,
    pub target: f64,
    pub pnl_pct: f64,
    pub status: String,
    pub date: String,
    pub time: String,
}

impl ExitRecord {
    pub fn from_signal(s: &Signal) -> Self {
        Self {
            symbol: s.symbol.clone(),
            side: s.side,
            mode: s.mode,
            entry: s.entry_price,
            current_price: s.entry_price,
            target: s.target_price,
            pnl_pct: 0.0,
            status: STATUS_OPEN.to_owned(),
            date: s.generated_at.format("%Y-%m-%d").to_string(),
            time: s.generated_at.format("%H:%M:%S").to_string(),
        }
    }
}

/// Row of the `coins` table: the active trading universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub symbol: String,
    pub active: bool,
    #[serde(default)]
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bar_id_minute_granularity() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
        assert_eq!(bar_id(t, "4h"), "2024-03-01T12:30|4h");
        // Seconds never leak into the id
        let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 7).unwrap();
        assert_eq!(bar_id(t, "4h"), bar_id(t2, "4h"));
    }

    #[test]
    fn signal_id_deterministic() {
        let a = signal_id("BTCUSDT", Mode::Swing, Side::Long, "2024-03-01T12:00|4h");
        let b = signal_id("BTCUSDT", Mode::Swing, Side::Long, "2024-03-01T12:00|4h");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn signal_id_distinguishes_tuple_fields() {
        let base = signal_id("BTCUSDT", Mode::Swing, Side::Long, "2024-03-01T12:00|4h");
        assert_ne!(base, signal_id("ETHUSDT", Mode::Swing, Side::Long, "2024-03-01T12:00|4h"));
        assert_ne!(base, signal_id("BTCUSDT", Mode::Positional, Side::Long, "2024-03-01T12:00|4h"));
        assert_ne!(base, signal_id("BTCUSDT", Mode::Swing, Side::Short, "2024-03-01T12:00|4h"));
        assert_ne!(base, signal_id("BTCUSDT", Mode::Swing, Side::Long, "2024-03-01T16:00|4h"));
    }

    #[test]
    fn record_serde_uses_upper_case_tags() {
        let json = serde_json::to_value(Side::Long).unwrap();
        assert_eq!(json, serde_json::json!("LONG"));
        let json = serde_json::to_value(Mode::Positional).unwrap();
        assert_eq!(json, serde_json::json!("POSITIONAL"));
    }
}
