//! Technical indicators over a candle window.
//!
//! The functions in the submodules are pure: they take slices, never mutate
//! them, and return `None` when the window is too short.
//! `IndicatorSnapshot` bundles the scalars the signal classifier reads for a
//! single evaluation instant.

pub mod adx;
pub mod rsi;
pub mod sma;

use crate::domain::candle::{self, Candle};
use std::fmt;

pub const RSI_PERIOD: usize = 14;
pub const ADX_PERIOD: usize = 14;
pub const MA_FAST_PERIOD: usize = 7;
pub const MA_SLOW_PERIOD: usize = 25;
pub const VOLUME_AVG_PERIOD: usize = 20;

/// Scalars derived from the trailing window of one symbol. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: f64,
    pub adx: Option<f64>,
    pub ma_fast: f64,
    pub ma_fast_prev: f64,
    pub ma_slow: f64,
    pub ma_slow_prev: f64,
    pub volume_now: f64,
    /// Trailing average excluding the current bar.
    pub volume_avg: f64,
}

impl IndicatorSnapshot {
    pub fn volume_ratio(&self) -> f64 {
        if self.volume_avg > 0.0 {
            self.volume_now / self.volume_avg
        } else {
            0.0
        }
    }

    /// Relative change of the slow average over the last bar.
    pub fn ma_slow_slope(&self) -> f64 {
        if self.ma_slow_prev == 0.0 {
            return 0.0;
        }
        (self.ma_slow - self.ma_slow_prev) / self.ma_slow_prev
    }

    /// |fast - slow| / slow
    pub fn ma_gap(&self) -> f64 {
        if self.ma_slow == 0.0 {
            return 0.0;
        }
        (self.ma_fast - self.ma_slow).abs() / self.ma_slow
    }
}

impl fmt::Display for IndicatorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "price {:.5} | MA7 {:.5} | MA25 {:.5} | RSI {:.2} | vol {:.2}/{:.2}",
            self.close, self.ma_fast, self.ma_slow, self.rsi, self.volume_now, self.volume_avg
        )?;
        if let Some(adx) = self.adx {
            write!(f, " | ADX {:.2}", adx)?;
        }
        Ok(())
    }
}

/// Bars needed before every field of the snapshot is defined.
pub fn min_snapshot_bars() -> usize {
    (MA_SLOW_PERIOD + 1)
        .max(VOLUME_AVG_PERIOD + 1)
        .max(RSI_PERIOD + 1)
}

/// Snapshot at the last candle, or `None` if the window is too short.
/// ADX is filled in only when the window also covers two ADX periods.
pub fn compute_snapshot(candles: &[Candle]) -> Option<IndicatorSnapshot> {
    if candles.len() < min_snapshot_bars() {
        return None;
    }

    let closes = candle::closes(candles);
    let volumes = candle::volumes(candles);

    let rsi = rsi::calculate_rsi(&closes, RSI_PERIOD)?;
    let adx = adx::calculate_adx(
        &candle::highs(candles),
        &candle::lows(candles),
        &closes,
        ADX_PERIOD,
    );

    let volume_now = *volumes.last()?;
    let volume_avg = sma::calculate_sma_prev(&volumes, VOLUME_AVG_PERIOD)?;

    Some(IndicatorSnapshot {
        close: *closes.last()?,
        rsi,
        adx,
        ma_fast: sma::calculate_sma(&closes, MA_FAST_PERIOD)?,
        ma_fast_prev: sma::calculate_sma_prev(&closes, MA_FAST_PERIOD)?,
        ma_slow: sma::calculate_sma(&closes, MA_SLOW_PERIOD)?,
        ma_slow_prev: sma::calculate_sma_prev(&closes, MA_SLOW_PERIOD)?,
        volume_now,
        volume_avg,
    })
}
