#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
pub use trailguard::domain::candle::Candle;
use trailguard::domain::error::TrailguardError;
pub use trailguard::domain::position::Position;
pub use trailguard::domain::signal::{Direction, Strength};
use trailguard::ports::market_data_port::MarketDataPort;
use trailguard::ports::notify_port::NotifyPort;
pub use trailguard::ports::order_port::OrderSide;
use trailguard::ports::order_port::OrderPort;
use trailguard::ports::position_store_port::PositionStorePort;

pub struct MockMarketData {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_candles(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TrailguardError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TrailguardError::MarketData {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let candles = self.data.get(symbol).cloned().unwrap_or_default();
        let skip = candles.len().saturating_sub(limit);
        Ok(candles[skip..].to_vec())
    }
}

#[derive(Default)]
pub struct RecordingOrders {
    pub submitted: RefCell<Vec<(String, OrderSide, f64)>>,
    pub fail: bool,
}

impl RecordingOrders {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sides(&self) -> Vec<(String, OrderSide)> {
        self.submitted
            .borrow()
            .iter()
            .map(|(s, side, _)| (s.clone(), *side))
            .collect()
    }
}

impl OrderPort for RecordingOrders {
    fn submit(&self, symbol: &str, side: OrderSide, leverage: f64) -> Result<(), TrailguardError> {
        self.submitted
            .borrow_mut()
            .push((symbol.to_string(), side, leverage));
        if self.fail {
            return Err(TrailguardError::Order {
                symbol: symbol.to_string(),
                reason: "HTTP 503".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: RefCell<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.borrow().iter().any(|m| m.contains(needle))
    }
}

impl NotifyPort for RecordingNotifier {
    fn notify(&self, message: &str) -> Result<(), TrailguardError> {
        self.messages.borrow_mut().push(message.to_string());
        if self.fail {
            return Err(TrailguardError::Notify {
                reason: "chat unreachable".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub rows: RefCell<BTreeMap<String, Position>>,
}

impl MemoryStore {
    pub fn with_position(self, position: Position) -> Self {
        self.rows
            .borrow_mut()
            .insert(position.symbol.clone(), position);
        self
    }

    pub fn row(&self, symbol: &str) -> Option<Position> {
        self.rows.borrow().get(symbol).cloned()
    }
}

impl PositionStorePort for MemoryStore {
    fn get(&self, symbol: &str) -> Result<Option<Position>, TrailguardError> {
        Ok(self.row(symbol))
    }

    fn upsert(&self, position: &Position) -> Result<(), TrailguardError> {
        self.rows
            .borrow_mut()
            .insert(position.symbol.clone(), position.clone());
        Ok(())
    }

    fn update_max_favorable(
        &self,
        symbol: &str,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, TrailguardError> {
        match self.rows.borrow_mut().get_mut(symbol) {
            Some(row) => {
                row.max_favorable_price = price;
                row.last_updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, symbol: &str) -> Result<bool, TrailguardError> {
        Ok(self.rows.borrow_mut().remove(symbol).is_some())
    }

    fn list(&self) -> Result<Vec<Position>, TrailguardError> {
        Ok(self.rows.borrow().values().cloned().collect())
    }

    fn clear(&self) -> Result<usize, TrailguardError> {
        let mut rows = self.rows.borrow_mut();
        let n = rows.len();
        rows.clear();
        Ok(n)
    }
}

pub fn at(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap()
}

/// 2024-01-15 12:00 UTC.
pub fn midday() -> DateTime<Utc> {
    at(1_705_320_000)
}

pub fn generate_candles(closes: &[f64], volumes: &[f64]) -> Vec<Candle> {
    let start = at(1_704_067_200);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| Candle {
            open_time: start + Duration::hours(i as i64),
            open: close,
            high: close * 1.002,
            low: close * 0.998,
            close,
            volume,
        })
        .collect()
}

/// Steady climb with flat volume until the last bar, which trades
/// `last_volume`.
pub fn uptrend(n: usize, last_volume: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 * 0.5).collect();
    let mut volumes = vec![100.0; n];
    volumes[n - 1] = last_volume;
    generate_candles(&closes, &volumes)
}

pub fn downtrend(n: usize, last_volume: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| 200.0 - i as f64 * 0.5).collect();
    let mut volumes = vec![100.0; n];
    volumes[n - 1] = last_volume;
    generate_candles(&closes, &volumes)
}

/// Flat series at `price`. Open positions only look at the last close.
pub fn closing_at(price: f64, n: usize) -> Vec<Candle> {
    generate_candles(&vec![price; n], &vec![100.0; n])
}

pub fn open_position(
    symbol: &str,
    direction: Direction,
    strength: Strength,
    entry: f64,
    max_favorable: f64,
) -> Position {
    Position {
        symbol: symbol.to_string(),
        entry_price: entry,
        direction,
        strength,
        max_favorable_price: max_favorable,
        opened_at: at(1_704_067_200),
        last_updated_at: at(1_704_067_200),
    }
}
