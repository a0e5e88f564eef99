//! Exit thresholds keyed by strength tier and unrealized profit.
//!
//! All thresholds are fractions of the favorable-excursion price
//! (0.012 = 1.2%).

use crate::domain::signal::Strength;

/// Threshold table selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitProfile {
    /// Drawdown ceiling per strength tier, trailing distance per tier and
    /// profit bucket.
    Tiered,
    /// Both thresholds keyed on the profit bucket only; strength is ignored.
    ProfitBucketed,
}

impl ExitProfile {
    pub fn name(&self) -> &'static str {
        match self {
            ExitProfile::Tiered => "tiered",
            ExitProfile::ProfitBucketed => "profit_bucketed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitPolicy {
    pub profile: ExitProfile,
    /// When set, the trailing stop stays inactive until the favorable
    /// excursion has reached this profit over entry.
    pub trailing_activation: Option<f64>,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self {
            profile: ExitProfile::Tiered,
            trailing_activation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfitBucket {
    Under2,
    Under5,
    Above5,
}

fn profit_bucket(profit: f64) -> ProfitBucket {
    if profit < 0.02 {
        ProfitBucket::Under2
    } else if profit < 0.05 {
        ProfitBucket::Under5
    } else {
        ProfitBucket::Above5
    }
}

impl ExitPolicy {
    pub fn new(profile: ExitProfile) -> Self {
        Self {
            profile,
            trailing_activation: None,
        }
    }

    pub fn with_trailing_activation(mut self, activation: f64) -> Self {
        self.trailing_activation = Some(activation);
        self
    }

    /// Retracement from the excursion that forces a close regardless of profit.
    pub fn mdd_threshold(&self, strength: Strength, profit: f64) -> f64 {
        match self.profile {
            ExitProfile::Tiered => match strength {
                Strength::Breakout => 0.020,
                Strength::Strong => 0.017,
                Strength::Normal => 0.012,
            },
            ExitProfile::ProfitBucketed => {
                if profit <= 0.0 {
                    0.005
                } else {
                    match profit_bucket(profit) {
                        ProfitBucket::Under2 => 0.008,
                        ProfitBucket::Under5 => 0.011,
                        ProfitBucket::Above5 => 0.014,
                    }
                }
            }
        }
    }

    /// Retracement from the excursion that takes profit.
    pub fn trailing_distance(&self, strength: Strength, profit: f64) -> f64 {
        let bucket = profit_bucket(profit);
        match self.profile {
            ExitProfile::Tiered => match (strength, bucket) {
                (Strength::Breakout, ProfitBucket::Under2) => 0.004,
                (Strength::Breakout, ProfitBucket::Under5) => 0.006,
                (Strength::Breakout, ProfitBucket::Above5) => 0.008,
                (Strength::Strong, ProfitBucket::Under2) => 0.006,
                (Strength::Strong, ProfitBucket::Under5) => 0.009,
                (Strength::Strong, ProfitBucket::Above5) => 0.012,
                (Strength::Normal, ProfitBucket::Under2) => 0.005,
                (Strength::Normal, ProfitBucket::Under5) => 0.008,
                (Strength::Normal, ProfitBucket::Above5) => 0.011,
            },
            ExitProfile::ProfitBucketed => match bucket {
                ProfitBucket::Under2 => 0.002,
                ProfitBucket::Under5 => 0.005,
                ProfitBucket::Above5 => 0.010,
            },
        }
    }

    /// Whether the trailing rule may fire given the best profit seen so far.
    pub fn trailing_active(&self, peak_profit: f64) -> bool {
        match self.trailing_activation {
            Some(activation) => peak_profit >= activation,
            None => true,
        }
    }
}
