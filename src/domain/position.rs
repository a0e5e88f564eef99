//! Open position record and exit evaluation.

use crate::domain::exit_policy::ExitPolicy;
use crate::domain::signal::{Direction, Signal, Strength};
use chrono::{DateTime, Utc};
use std::fmt;

/// The only persisted entity. One row per symbol while OPEN.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub entry_price: f64,
    pub direction: Direction,
    pub strength: Strength,
    /// Best price seen in the favorable direction since entry.
    pub max_favorable_price: f64,
    pub opened_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    MaxDrawdownCut,
    TrailingStop,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::MaxDrawdownCut => write!(f, "MDD cut"),
            CloseReason::TrailingStop => write!(f, "trailing stop"),
        }
    }
}

/// Figures behind one exit decision, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitCheck {
    pub profit: f64,
    pub drawdown: f64,
    pub mdd_threshold: f64,
    pub trailing_distance: f64,
    pub reason: Option<CloseReason>,
}

impl Position {
    pub fn open(symbol: &str, signal: Signal, price: f64, now: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            entry_price: price,
            direction: signal.direction,
            strength: signal.strength,
            max_favorable_price: price,
            opened_at: now,
            last_updated_at: now,
        }
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    /// Unrealized return over entry, positive when in profit.
    pub fn profit(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Long => (price - self.entry_price) / self.entry_price,
            Direction::Short => (self.entry_price - price) / self.entry_price,
        }
    }

    /// Retracement from the favorable excursion as a fraction of it.
    pub fn drawdown(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Long => (self.max_favorable_price - price) / self.max_favorable_price,
            Direction::Short => (price - self.max_favorable_price) / self.max_favorable_price,
        }
    }

    /// Profit at the favorable excursion.
    pub fn peak_profit(&self) -> f64 {
        self.profit(self.max_favorable_price)
    }

    /// True when `price` extends the favorable excursion.
    pub fn is_new_excursion(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price > self.max_favorable_price,
            Direction::Short => price < self.max_favorable_price,
        }
    }

    /// Moves `max_favorable_price` to `price` if it is better. Returns
    /// whether the record changed.
    pub fn track_excursion(&mut self, price: f64, now: DateTime<Utc>) -> bool {
        if !self.is_new_excursion(price) {
            return false;
        }
        self.max_favorable_price = price;
        self.last_updated_at = now;
        true
    }

    /// First matching close rule at `price`: drawdown ceiling, then trailing stop.
    pub fn evaluate_exit(&self, price: f64, policy: &ExitPolicy) -> ExitCheck {
        let profit = self.profit(price);
        let drawdown = self.drawdown(price);
        let mdd_threshold = policy.mdd_threshold(self.strength, profit);
        let trailing_distance = policy.trailing_distance(self.strength, profit);

        let past_entry = match self.direction {
            Direction::Long => price > self.entry_price,
            Direction::Short => price < self.entry_price,
        };

        let reason = if drawdown >= mdd_threshold {
            Some(CloseReason::MaxDrawdownCut)
        } else if profit > 0.0
            && past_entry
            && drawdown >= trailing_distance
            && policy.trailing_active(self.peak_profit())
        {
            Some(CloseReason::TrailingStop)
        } else {
            None
        };

        ExitCheck {
            profit,
            drawdown,
            mdd_threshold,
            trailing_distance,
            reason,
        }
    }
}
