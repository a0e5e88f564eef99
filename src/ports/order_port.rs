//! Order submission port trait.

use crate::domain::error::TrailguardError;
use crate::domain::signal::Direction;
use std::fmt;

/// Order intent sent to the execution endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Long,
    Short,
    /// Close whatever is open on the pair.
    Flat,
}

impl From<Direction> for OrderSide {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Long => OrderSide::Long,
            Direction::Short => OrderSide::Short,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Long => write!(f, "LONG"),
            OrderSide::Short => write!(f, "SHORT"),
            OrderSide::Flat => write!(f, "FLAT"),
        }
    }
}

pub trait OrderPort {
    fn submit(&self, symbol: &str, side: OrderSide, leverage: f64) -> Result<(), TrailguardError>;
}
