//! ADX (Average Directional Index).
//!
//! - +DM / -DM from consecutive high/low deltas, floored at 0; only the
//!   larger of the two is kept per bar
//! - True range per bar against the previous close
//! - TR, +DM and -DM smoothed with a `period`-bar simple moving sum
//! - DX = 100 * |+DI - -DI| / (+DI + -DI)
//! - ADX = `period`-bar mean of DX
//!
//! Needs at least `2 * period` bars; returns `None` otherwise.

/// ADX at the last bar.
pub fn calculate_adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let n = closes.len();
    if period == 0 || highs.len() != n || lows.len() != n || n < 2 * period {
        return None;
    }

    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    let mut tr = Vec::with_capacity(n - 1);

    for i in 1..n {
        let up = highs[i] - highs[i - 1];
        let down = lows[i - 1] - lows[i];
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });

        let hl = highs[i] - lows[i];
        let hc = (highs[i] - closes[i - 1]).abs();
        let lc = (lows[i] - closes[i - 1]).abs();
        tr.push(hl.max(hc).max(lc));
    }

    let tr_sum = moving_sum(&tr, period);
    let plus_sum = moving_sum(&plus_dm, period);
    let minus_sum = moving_sum(&minus_dm, period);

    let dx: Vec<f64> = tr_sum
        .iter()
        .zip(plus_sum.iter().zip(minus_sum.iter()))
        .map(|(&atr, (&plus, &minus))| {
            if atr <= 0.0 {
                return 0.0;
            }
            let plus_di = 100.0 * plus / atr;
            let minus_di = 100.0 * minus / atr;
            let di_sum = plus_di + minus_di;
            if di_sum <= 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            }
        })
        .collect();

    let adx = moving_sum(&dx, period);
    adx.last().map(|sum| sum / period as f64)
}

/// Sums of every full `period` window, oldest first.
fn moving_sum(values: &[f64], period: usize) -> Vec<f64> {
    values.windows(period).map(|w| w.iter().sum()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trending_up(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let highs = (0..n).map(|i| 101.0 + i as f64).collect();
        let lows = (0..n).map(|i| 99.0 + i as f64).collect();
        let closes = (0..n).map(|i| 100.0 + i as f64).collect();
        (highs, lows, closes)
    }

    #[test]
    fn adx_requires_two_periods() {
        let (h, l, c) = trending_up(27);
        assert_eq!(calculate_adx(&h, &l, &c, 14), None);

        let (h, l, c) = trending_up(28);
        assert!(calculate_adx(&h, &l, &c, 14).is_some());
    }

    #[test]
    fn adx_rejects_mismatched_lengths() {
        let (h, l, c) = trending_up(40);
        assert_eq!(calculate_adx(&h[..39], &l, &c, 14), None);
    }

    #[test]
    fn adx_zero_period() {
        let (h, l, c) = trending_up(40);
        assert_eq!(calculate_adx(&h, &l, &c, 0), None);
    }

    #[test]
    fn adx_pure_uptrend_is_100() {
        // Every bar: +DM = 1, -DM = 0 → +DI > 0, -DI = 0 → DX = 100
        let (h, l, c) = trending_up(40);
        let adx = calculate_adx(&h, &l, &c, 14).unwrap();
        assert_relative_eq!(adx, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn adx_pure_downtrend_is_100() {
        let n = 40;
        let highs: Vec<f64> = (0..n).map(|i| 201.0 - i as f64).collect();
        let lows: Vec<f64> = (0..n).map(|i| 199.0 - i as f64).collect();
        let closes: Vec<f64> = (0..n).map(|i| 200.0 - i as f64).collect();
        let adx = calculate_adx(&highs, &lows, &closes, 14).unwrap();
        assert_relative_eq!(adx, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn adx_flat_market_is_zero() {
        let highs = vec![101.0; 40];
        let lows = vec![99.0; 40];
        let closes = vec![100.0; 40];
        assert_eq!(calculate_adx(&highs, &lows, &closes, 14), Some(0.0));
    }

    #[test]
    fn adx_constant_prices_no_nan() {
        let flat = vec![100.0; 40];
        let adx = calculate_adx(&flat, &flat, &flat, 14).unwrap();
        assert!(!adx.is_nan());
        assert_eq!(adx, 0.0);
    }

    #[test]
    fn adx_choppy_market_within_bounds() {
        let n = 60;
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let highs: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
        let adx = calculate_adx(&highs, &lows, &closes, 14).unwrap();
        assert!((0.0..=100.0).contains(&adx), "ADX {} out of range", adx);
    }

    #[test]
    fn moving_sum_windows() {
        assert_eq!(moving_sum(&[1.0, 2.0, 3.0, 4.0], 2), vec![3.0, 5.0, 7.0]);
        assert!(moving_sum(&[1.0], 2).is_empty());
    }
}
