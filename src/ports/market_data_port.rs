//! Market data port trait.

use crate::domain::candle::Candle;
use crate::domain::error::TrailguardError;

pub trait MarketDataPort {
    /// Up to `limit` most recent candles of `interval`, oldest first. The
    /// last candle may still be forming.
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TrailguardError>;
}
