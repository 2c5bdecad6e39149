/// feed.rs — Exchange price feed over Binance Futures REST
///
/// Only public market-data endpoints are used; no request signing. Every
/// call carries a bounded client timeout and a small retry budget, and the
/// caller treats any remaining failure as per-symbol and non-fatal.
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::error::FeedError;
use crate::models::Bar;

#[allow(async_fn_in_trait)]
pub trait PriceFeed {
    /// Fetch up to `limit` most recent OHLCV bars, ascending in time.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> Result<Vec<Bar>, FeedError>;

    /// Latest traded price for one symbol.
    async fn last_price(&self, symbol: &str) -> Result<f64, FeedError>;
}

pub struct BinanceFeed {
    client: Client,
    base_url: String,
    retries: u32,
}

impl BinanceFeed {
    pub fn new(base_url: &str, timeout_secs: u64, retries: u32) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            retries,
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, FeedError> {
        let mut attempt = 0;
        loop {
            match self.try_get_json(url).await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!("Feed request failed (attempt {attempt}): {e}");
                    sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get_json(&self, url: &str) -> Result<Value, FeedError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| FeedError::Malformed(e.to_string()))
    }
}

fn field_f64(cell: &Value) -> Option<f64> {
    match cell {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Parse one kline row of the exchange's array-of-arrays payload:
/// [open_time_ms, open, high, low, close, volume, ...]
fn parse_kline(row: &Value) -> Result<Bar, FeedError> {
    let arr = row
        .as_array()
        .ok_or_else(|| FeedError::Malformed("kline row is not an array".into()))?;
    if arr.len() < 6 {
        return Err(FeedError::Malformed(format!(
            "kline row has {} fields, expected at least 6",
            arr.len()
        )));
    }
    let open_time_ms = arr[0]
        .as_i64()
        .ok_or_else(|| FeedError::Malformed("kline open time is not an integer".into()))?;
    let open_time: DateTime<Utc> = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .ok_or_else(|| FeedError::Malformed("kline open time out of range".into()))?;

    let mut fields = [0.0f64; 5];
    for (i, slot) in fields.iter_mut().enumerate() {
        *slot = field_f64(&arr[i + 1])
            .ok_or_else(|| FeedError::Malformed(format!("kline field {} unparsable", i + 1)))?;
    }
    Ok(Bar {
        open_time,
        open: fields[0],
        high: fields[1],
        low: fields[2],
        close: fields[3],
        volume: fields[4],
    })
}

impl PriceFeed for BinanceFeed {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> Result<Vec<Bar>, FeedError> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, timeframe, limit
        );
        let payload = self.get_json(&url).await?;
        let rows = payload
            .as_array()
            .ok_or_else(|| FeedError::Malformed("klines payload is not an array".into()))?;
        rows.iter().map(parse_kline).collect()
    }

    async fn last_price(&self, symbol: &str) -> Result<f64, FeedError> {
        let url = format!("{}/fapi/v1/ticker/price?symbol={}", self.base_url, symbol);
        let payload = self.get_json(&url).await?;
        payload
            .get("price")
            .and_then(field_f64)
            .ok_or_else(|| FeedError::Malformed("ticker payload has no price".into()))
    }
}
