//! Entry-signal classification.
//!
//! A signal fires for a direction only when its trend, volume and momentum
//! gates all pass on the same evaluation. The long and short gates are
//! mutually exclusive because they require opposite moves of the fast
//! average (and opposite sides of RSI 50). The strength tier is then read
//! from volume and RSI intensity.

use crate::domain::candle::Candle;
use crate::domain::indicator::IndicatorSnapshot;
use std::fmt;
use std::str::FromStr;

/// Fewer candles than this never produce a signal.
pub const MIN_SIGNAL_BARS: usize = 30;

const SLOW_SLOPE_LIMIT: f64 = 0.001;
const VOLUME_GATE: f64 = 1.2;
const RSI_MIDLINE: f64 = 50.0;
const AVG_RANGE_BARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LONG" => Ok(Direction::Long),
            "SHORT" => Ok(Direction::Short),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Conviction tier, ordered from least to most aggressive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strength {
    Normal,
    Strong,
    Breakout,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::Normal => write!(f, "NORMAL"),
            Strength::Strong => write!(f, "STRONG"),
            Strength::Breakout => write!(f, "BREAKOUT"),
        }
    }
}

impl FromStr for Strength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            // rows written without a tier predate strength tiers
            "NORMAL" | "" => Ok(Strength::Normal),
            "STRONG" => Ok(Strength::Strong),
            "BREAKOUT" => Ok(Strength::Breakout),
            other => Err(format!("unknown strength '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub direction: Direction,
    pub strength: Strength,
}

/// Gate set used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryProfile {
    /// Fast-average slope, slow-average filter, volume and RSI gates.
    Tiered,
    /// `Tiered` plus an ADX trend-strength floor, a minimum fast/slow
    /// separation and a minimum average close-to-close move.
    AdxGated {
        min_adx: f64,
        min_ma_gap: f64,
        min_avg_range: f64,
    },
    /// Fast average crossing the slow one, with volume and RSI gates.
    Crossover,
}

impl EntryProfile {
    pub fn adx_gated_default() -> Self {
        EntryProfile::AdxGated {
            min_adx: 20.0,
            min_ma_gap: 0.00072,
            min_avg_range: 0.001,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntryProfile::Tiered => "tiered",
            EntryProfile::AdxGated { .. } => "adx",
            EntryProfile::Crossover => "crossover",
        }
    }
}

/// Classify the latest bar of `candles`. `snapshot` must be computed from
/// the same window.
pub fn classify(
    candles: &[Candle],
    snapshot: &IndicatorSnapshot,
    profile: &EntryProfile,
) -> Option<Signal> {
    if candles.len() < MIN_SIGNAL_BARS {
        return None;
    }

    let direction = [Direction::Long, Direction::Short]
        .into_iter()
        .find(|&d| {
            trend_gate(snapshot, d, profile)
                && volume_gate(snapshot)
                && momentum_gate(snapshot, d)
        })?;

    if let EntryProfile::AdxGated {
        min_adx,
        min_ma_gap,
        min_avg_range,
    } = *profile
    {
        let adx = snapshot.adx?;
        if adx < min_adx || snapshot.ma_gap() < min_ma_gap {
            return None;
        }
        if average_range(candles, AVG_RANGE_BARS)? <= min_avg_range {
            return None;
        }
    }

    Some(Signal {
        direction,
        strength: strength_tier(snapshot, direction),
    })
}

fn trend_gate(s: &IndicatorSnapshot, direction: Direction, profile: &EntryProfile) -> bool {
    match (profile, direction) {
        (EntryProfile::Crossover, Direction::Long) => {
            s.ma_fast_prev <= s.ma_slow_prev && s.ma_fast > s.ma_slow
        }
        (EntryProfile::Crossover, Direction::Short) => {
            s.ma_fast_prev >= s.ma_slow_prev && s.ma_fast < s.ma_slow
        }
        (_, Direction::Long) => s.ma_fast > s.ma_fast_prev && s.ma_slow_slope() > -SLOW_SLOPE_LIMIT,
        (_, Direction::Short) => s.ma_fast < s.ma_fast_prev && s.ma_slow_slope() < SLOW_SLOPE_LIMIT,
    }
}

fn volume_gate(s: &IndicatorSnapshot) -> bool {
    s.volume_now > VOLUME_GATE * s.volume_avg
}

fn momentum_gate(s: &IndicatorSnapshot, direction: Direction) -> bool {
    match direction {
        Direction::Long => s.rsi > RSI_MIDLINE,
        Direction::Short => s.rsi < RSI_MIDLINE,
    }
}

/// Highest tier whose volume and RSI thresholds are both met.
pub fn strength_tier(s: &IndicatorSnapshot, direction: Direction) -> Strength {
    let rsi_beyond = |long_level: f64| match direction {
        Direction::Long => s.rsi >= long_level,
        Direction::Short => s.rsi <= 100.0 - long_level,
    };

    if s.volume_now >= 2.0 * s.volume_avg && rsi_beyond(65.0) {
        Strength::Breakout
    } else if s.volume_now >= 1.5 * s.volume_avg && rsi_beyond(55.0) {
        Strength::Strong
    } else {
        Strength::Normal
    }
}

/// Mean absolute close-to-close move over the last `bars` bars.
fn average_range(candles: &[Candle], bars: usize) -> Option<f64> {
    if bars == 0 || candles.len() < bars + 1 {
        return None;
    }
    let tail = &candles[candles.len() - bars - 1..];
    let total: f64 = tail.windows(2).map(|w| (w[1].close - w[0].close).abs()).sum();
    Some(total / bars as f64)
}
