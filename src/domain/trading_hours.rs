//! Optional UTC trading window, e.g. `08:00-20:00`.
//!
//! A window whose start is after its end wraps midnight (`22:00-06:00`).
//! Outside the window no new positions are opened; open ones are still
//! managed.

use chrono::{DateTime, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingHours {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let t = now.time();
        if self.start <= self.end {
            t >= self.start && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

impl FromStr for TradingHours {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("expected HH:MM-HH:MM, got '{s}'"))?;
        let parse = |part: &str| {
            NaiveTime::parse_from_str(part.trim(), "%H:%M")
                .map_err(|e| format!("invalid time '{}': {e}", part.trim()))
        };
        let hours = TradingHours {
            start: parse(start)?,
            end: parse(end)?,
        };
        if hours.start == hours.end {
            return Err("trading window start and end are equal".to_string());
        }
        Ok(hours)
    }
}

impl fmt::Display for TradingHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}
