//! CSV file market data adapter for offline and dry runs.
//!
//! Reads `<dir>/<SYMBOL>.csv` with the header
//! `open_time,open,high,low,close,volume`. `open_time` is either RFC 3339
//! or epoch milliseconds. The interval argument is ignored; each file holds
//! one series.

use crate::domain::candle::Candle;
use crate::domain::error::TrailguardError;
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, Utc};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn parse_open_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn column(
    record: &StringRecord,
    idx: usize,
    name: &str,
    symbol: &str,
) -> Result<f64, TrailguardError> {
    let raw = record.get(idx).ok_or_else(|| TrailguardError::MarketData {
        symbol: symbol.to_string(),
        reason: format!("missing {name} column"),
    })?;
    raw.trim().parse().map_err(|e| TrailguardError::MarketData {
        symbol: symbol.to_string(),
        reason: format!("invalid {name} value '{raw}': {e}"),
    })
}

impl MarketDataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TrailguardError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TrailguardError::MarketData {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TrailguardError::MarketData {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw_time = record.get(0).ok_or_else(|| TrailguardError::MarketData {
                symbol: symbol.to_string(),
                reason: "missing open_time column".into(),
            })?;
            let open_time =
                parse_open_time(raw_time.trim()).ok_or_else(|| TrailguardError::MarketData {
                    symbol: symbol.to_string(),
                    reason: format!("invalid open_time '{raw_time}'"),
                })?;

            candles.push(Candle {
                open_time,
                open: column(&record, 1, "open", symbol)?,
                high: column(&record, 2, "high", symbol)?,
                low: column(&record, 3, "low", symbol)?,
                close: column(&record, 4, "close", symbol)?,
                volume: column(&record, 5, "volume", symbol)?,
            });
        }

        candles.sort_by_key(|c| c.open_time);
        let skip = candles.len().saturating_sub(limit);
        candles.drain(..skip);
        debug!(symbol, bars = candles.len(), path = %path.display(), "loaded candles");
        Ok(candles)
    }
}
