//! Simple moving average.
//!
//! Recomputed from the live window on every call; nothing is cached between
//! evaluations.

/// Arithmetic mean of the trailing `period` values.
pub fn calculate_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Mean of the `period` values ending one bar before the last.
pub fn calculate_sma_prev(values: &[f64], period: usize) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    calculate_sma(&values[..values.len() - 1], period)
}
