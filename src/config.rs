/// config.rs — Centralised configuration loaded from .env
///
/// All parameters consumed by the engine are defined here. Loading happens
/// once at startup; every module borrows &AppConfig. This replaces the
/// source project's scattered env lookups with try/except fallback chains.
use anyhow::Result;
use std::env;

use crate::indicators::IndicatorParams;
use crate::models::Mode;

pub const DEFAULT_ATR_WINDOW: usize = 14;
pub const DEFAULT_DONCHIAN_WINDOW: usize = 20;
/// One tick every 10 minutes, matching the source worker's cadence.
pub const DEFAULT_TICK_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── Exchange feed ────────────────────────────────────────────────
    pub rest_url: String,
    pub http_timeout_secs: u64,
    pub feed_retries: u32,

    // ── Trading universe ─────────────────────────────────────────────
    /// Fallback universe when the coins table is empty or unreadable.
    pub symbols: Vec<String>,
    pub swing_timeframe: String,
    pub positional_timeframe: String,

    // ── Indicator windows ────────────────────────────────────────────
    pub atr_window: usize,
    pub donchian_window: usize,
    /// Bars fetched per (symbol, timeframe) scan; must exceed the larger
    /// window or every scan stays in warmup.
    pub ohlcv_limit: u32,

    // ── Scheduler ────────────────────────────────────────────────────
    pub tick_secs: u64,
    pub auto_engine: bool,
    pub notifications: bool,

    // ── Persistence ──────────────────────────────────────────────────
    pub db_path: String,
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // ignore missing .env

        let rest_url = env::var("EXCHANGE_REST_URL")
            .unwrap_or_else(|_| "https://fapi.binance.com".into());

        let symbols: Vec<String> = env::var("TRADING_PAIRS")
            .unwrap_or_else(|_| "BTCUSDT,ETHUSDT".into())
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();

        let auto_engine = env::var("AUTO_ENGINE")
            .unwrap_or_else(|_| "true".into())
            .to_lowercase()
            == "true";
        let notifications = env::var("NOTIFICATIONS_ENABLED")
            .unwrap_or_else(|_| "false".into())
            .to_lowercase()
            == "true";

        let cfg = Self {
            rest_url,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 10u64)?,
            feed_retries: parse_env("FEED_RETRIES", 2u32)?,

            symbols,
            swing_timeframe: env::var("SWING_TIMEFRAME").unwrap_or_else(|_| "4h".into()),
            positional_timeframe: env::var("POSITIONAL_TIMEFRAME").unwrap_or_else(|_| "1d".into()),

            atr_window: parse_env("ATR_WINDOW", DEFAULT_ATR_WINDOW)?,
            donchian_window: parse_env("DONCHIAN_WINDOW", DEFAULT_DONCHIAN_WINDOW)?,
            ohlcv_limit: parse_env("OHLCV_LIMIT", 120u32)?,

            tick_secs: parse_env("TICK_INTERVAL_SECS", DEFAULT_TICK_SECS)?,
            auto_engine,
            notifications,

            db_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "autotrader.db".into()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.atr_window == 0 || self.donchian_window == 0 {
            anyhow::bail!("Indicator windows must be >= 1");
        }
        let warmup = self.atr_window.max(self.donchian_window);
        if (self.ohlcv_limit as usize) <= warmup + 1 {
            anyhow::bail!(
                "OHLCV_LIMIT {} too small for warmup {} (need at least {})",
                self.ohlcv_limit,
                warmup,
                warmup + 2
            );
        }
        if self.tick_secs == 0 {
            anyhow::bail!("TICK_INTERVAL_SECS must be >= 1");
        }
        Ok(())
    }

    /// The (mode, timeframe) matrix scanned each tick. Owned timeframes so
    /// callers can iterate the matrix while mutating their own state.
    pub fn mode_matrix(&self) -> [(Mode, String); 2] {
        [
            (Mode::Swing, self.swing_timeframe.clone()),
            (Mode::Positional, self.positional_timeframe.clone()),
        ]
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            atr_window: self.atr_window,
            donchian_window: self.donchian_window,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Config key {key}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            rest_url: "https://fapi.binance.com".into(),
            http_timeout_secs: 10,
            feed_retries: 2,
            symbols: vec!["BTCUSDT".into()],
            swing_timeframe: "4h".into(),
            positional_timeframe: "1d".into(),
            atr_window: 14,
            donchian_window: 20,
            ohlcv_limit: 120,
            tick_secs: 600,
            auto_engine: true,
            notifications: false,
            db_path: "autotrader.db".into(),
        }
    }

    #[test]
    fn mode_matrix_covers_both_modes() {
        let cfg = base_config();
        let matrix = cfg.mode_matrix();
        assert_eq!(matrix[0], (Mode::Swing, "4h".to_string()));
        assert_eq!(matrix[1], (Mode::Positional, "1d".to_string()));
    }

    #[test]
    fn mode_matrix_is_owned() {
        // The matrix must not borrow from the config: the scheduler iterates
        // it while mutably driving the rest of the engine.
        let matrix = base_config().mode_matrix();
        assert_eq!(matrix.len(), 2);
    }

    #[test]
    fn validation_rejects_tiny_fetch_limit() {
        let mut cfg = base_config();
        cfg.ohlcv_limit = 20;
        assert!(cfg.validate().is_err());
        cfg.ohlcv_limit = 22;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_windows() {
        let mut cfg = base_config();
        cfg.donchian_window = 0;
        assert!(cfg.validate().is_err());
    }
}
