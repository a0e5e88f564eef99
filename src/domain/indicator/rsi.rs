//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - Seed: gains and losses of the first `period` deltas, each summed and divided by `period`
//! - Subsequent: avg = (prev_avg * (period - 1) + current) / period
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Needs at least `period + 1` closes; returns `None` otherwise.

/// RSI of the last close in `closes`.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let (seed, rest) = deltas.split_at(period);
    let mut avg_gain = seed.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = -seed.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

    for &delta in rest {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}
