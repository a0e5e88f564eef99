//! Position store port trait.
//!
//! The store is the only record of open positions; nothing is mirrored in
//! process memory between scans.

use crate::domain::error::TrailguardError;
use crate::domain::position::Position;
use chrono::{DateTime, Utc};

pub trait PositionStorePort {
    /// `None` means the symbol is FLAT.
    fn get(&self, symbol: &str) -> Result<Option<Position>, TrailguardError>;

    /// Writes the row for `position.symbol`, replacing any existing one.
    fn upsert(&self, position: &Position) -> Result<(), TrailguardError>;

    /// Returns `false` if no row existed.
    fn update_max_favorable(
        &self,
        symbol: &str,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, TrailguardError>;

    /// Returns `false` if no row existed.
    fn delete(&self, symbol: &str) -> Result<bool, TrailguardError>;

    fn list(&self) -> Result<Vec<Position>, TrailguardError>;

    /// Removes every row, returning how many were deleted.
    fn clear(&self) -> Result<usize, TrailguardError>;
}
