//! Per-symbol position state machine: FLAT → OPEN → FLAT.
//!
//! FLAT means the store has no row for the symbol. Every transition goes
//! through the store; the only mutations are create, excursion update and
//! delete.

use crate::domain::error::TrailguardError;
use crate::domain::exit_policy::ExitPolicy;
use crate::domain::position::{CloseReason, ExitCheck, Position};
use crate::domain::signal::Signal;
use crate::ports::position_store_port::PositionStorePort;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Opened(Position),
    Held {
        position: Position,
        check: ExitCheck,
        excursion_updated: bool,
    },
    Closed {
        position: Position,
        check: ExitCheck,
        reason: CloseReason,
    },
}

/// FLAT → OPEN. Fails with `PositionExists` if the symbol already has a row.
pub fn open_position(
    store: &dyn PositionStorePort,
    symbol: &str,
    signal: Signal,
    price: f64,
    now: DateTime<Utc>,
) -> Result<Transition, TrailguardError> {
    if store.get(symbol)?.is_some() {
        return Err(TrailguardError::PositionExists {
            symbol: symbol.to_string(),
        });
    }

    let position = Position::open(symbol, signal, price, now);
    store.upsert(&position)?;
    info!(
        symbol,
        direction = %position.direction,
        strength = %position.strength,
        entry = price,
        "position opened"
    );
    Ok(Transition::Opened(position))
}

/// One scan of an OPEN position: extend the excursion if the price is
/// better, then apply the close rules. Closing deletes the row.
pub fn manage_position(
    store: &dyn PositionStorePort,
    mut position: Position,
    price: f64,
    now: DateTime<Utc>,
    policy: &ExitPolicy,
) -> Result<Transition, TrailguardError> {
    let excursion_updated = position.track_excursion(price, now);
    if excursion_updated {
        if !store.update_max_favorable(&position.symbol, price, now)? {
            return Err(TrailguardError::PositionMissing {
                symbol: position.symbol.clone(),
            });
        }
        info!(
            symbol = %position.symbol,
            direction = %position.direction,
            max_favorable = price,
            "excursion extended"
        );
    }

    let check = position.evaluate_exit(price, policy);
    debug!(
        symbol = %position.symbol,
        profit = check.profit,
        drawdown = check.drawdown,
        trailing = check.trailing_distance,
        mdd = check.mdd_threshold,
        "exit check"
    );

    let Some(reason) = check.reason else {
        return Ok(Transition::Held {
            position,
            check,
            excursion_updated,
        });
    };

    if !store.delete(&position.symbol)? {
        return Err(TrailguardError::PositionMissing {
            symbol: position.symbol.clone(),
        });
    }
    info!(
        symbol = %position.symbol,
        %reason,
        profit = check.profit,
        drawdown = check.drawdown,
        "position closed"
    );
    Ok(Transition::Closed {
        position,
        check,
        reason,
    })
}
