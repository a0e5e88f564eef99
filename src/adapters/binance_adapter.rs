//! Binance public REST market data adapter.
//!
//! `GET {base_url}/api/v3/klines?symbol=..&interval=..&limit=..` returns an
//! array of arrays; prices and volumes come back as decimal strings.

use crate::domain::candle::Candle;
use crate::domain::error::TrailguardError;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use chrono::DateTime;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

pub struct BinanceAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TrailguardError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrailguardError::ConfigInvalid {
                section: "market".into(),
                key: "base_url".into(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrailguardError> {
        let base_url = config
            .get_string("market", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = config.get_int("market", "timeout_seconds", 10).max(1) as u64;
        Self::new(&base_url, Duration::from_secs(timeout))
    }

    fn klines_url(&self, symbol: &str, interval: &str, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={symbol}&interval={interval}&limit={limit}",
            self.base_url
        )
    }
}

fn kline_error(symbol: &str, reason: impl Into<String>) -> TrailguardError {
    TrailguardError::MarketData {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

fn decimal(row: &[Value], idx: usize, name: &str, symbol: &str) -> Result<f64, TrailguardError> {
    match row.get(idx) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|e| kline_error(symbol, format!("invalid {name} '{s}': {e}"))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| kline_error(symbol, format!("invalid {name} {n}"))),
        _ => Err(kline_error(symbol, format!("missing {name} field"))),
    }
}

/// Parses a klines response body into candles, oldest first.
pub fn parse_klines(symbol: &str, body: &str) -> Result<Vec<Candle>, TrailguardError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| kline_error(symbol, format!("unexpected klines payload: {e}")))?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        let open_ms = row
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| kline_error(symbol, "missing open time"))?;
        let open_time = DateTime::from_timestamp_millis(open_ms)
            .ok_or_else(|| kline_error(symbol, format!("invalid open time {open_ms}")))?;

        candles.push(Candle {
            open_time,
            open: decimal(&row, 1, "open", symbol)?,
            high: decimal(&row, 2, "high", symbol)?,
            low: decimal(&row, 3, "low", symbol)?,
            close: decimal(&row, 4, "close", symbol)?,
            volume: decimal(&row, 5, "volume", symbol)?,
        });
    }
    candles.sort_by_key(|c| c.open_time);
    Ok(candles)
}

impl MarketDataPort for BinanceAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TrailguardError> {
        let url = self.klines_url(symbol, interval, limit);
        debug!(symbol, interval, limit, "fetching klines");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| kline_error(symbol, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| kline_error(symbol, format!("failed to read body: {e}")))?;
        if !status.is_success() {
            return Err(kline_error(symbol, format!("HTTP {status}: {body}")));
        }

        parse_klines(symbol, &body)
    }
}
