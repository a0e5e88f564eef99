//! PostgreSQL position store.

use crate::domain::error::TrailguardError;
use crate::domain::position::Position;
use crate::ports::config_port::ConfigPort;
use crate::ports::position_store_port::PositionStorePort;
use chrono::{DateTime, Utc};
use postgres::{Client, NoTls, Row};
use std::cell::RefCell;

const COLUMNS: &str = "symbol, entry_price, direction, strength, max_favorable_price, \
                       opened_at, last_updated_at";

pub struct PostgresAdapter {
    client: RefCell<Client>,
}

fn query_error(e: postgres::Error) -> TrailguardError {
    TrailguardError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn row_to_position(row: &Row) -> Result<Position, TrailguardError> {
    let direction: String = row.get(2);
    let strength: String = row.get(3);
    let bad_label = |reason: String| TrailguardError::DatabaseQuery { reason };

    Ok(Position {
        symbol: row.get(0),
        entry_price: row.get(1),
        direction: direction.parse().map_err(bad_label)?,
        strength: strength.parse().map_err(bad_label)?,
        max_favorable_price: row.get(4),
        opened_at: row.get(5),
        last_updated_at: row.get(6),
    })
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrailguardError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| TrailguardError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let client =
            Client::connect(&connection_string, NoTls).map_err(|e| TrailguardError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: RefCell::new(client),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), TrailguardError> {
        self.client
            .borrow_mut()
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS positions (
                    symbol TEXT PRIMARY KEY,
                    entry_price DOUBLE PRECISION NOT NULL,
                    direction TEXT NOT NULL,
                    strength TEXT NOT NULL,
                    max_favorable_price DOUBLE PRECISION NOT NULL,
                    opened_at TIMESTAMPTZ NOT NULL,
                    last_updated_at TIMESTAMPTZ NOT NULL
                )",
            )
            .map_err(query_error)
    }
}

impl PositionStorePort for PostgresAdapter {
    fn get(&self, symbol: &str) -> Result<Option<Position>, TrailguardError> {
        let row = self
            .client
            .borrow_mut()
            .query_opt(
                format!("SELECT {COLUMNS} FROM positions WHERE symbol = $1").as_str(),
                &[&symbol],
            )
            .map_err(query_error)?;
        row.as_ref().map(row_to_position).transpose()
    }

    fn upsert(&self, position: &Position) -> Result<(), TrailguardError> {
        self.client
            .borrow_mut()
            .execute(
                format!(
                    "INSERT INTO positions ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)
                     ON CONFLICT (symbol) DO UPDATE SET
                        entry_price = EXCLUDED.entry_price,
                        direction = EXCLUDED.direction,
                        strength = EXCLUDED.strength,
                        max_favorable_price = EXCLUDED.max_favorable_price,
                        opened_at = EXCLUDED.opened_at,
                        last_updated_at = EXCLUDED.last_updated_at"
                )
                .as_str(),
                &[
                    &position.symbol,
                    &position.entry_price,
                    &position.direction.to_string(),
                    &position.strength.to_string(),
                    &position.max_favorable_price,
                    &position.opened_at,
                    &position.last_updated_at,
                ],
            )
            .map_err(query_error)?;
        Ok(())
    }

    fn update_max_favorable(
        &self,
        symbol: &str,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, TrailguardError> {
        let changed = self
            .client
            .borrow_mut()
            .execute(
                "UPDATE positions SET max_favorable_price = $1, last_updated_at = $2 \
                 WHERE symbol = $3",
                &[&price, &at, &symbol],
            )
            .map_err(query_error)?;
        Ok(changed > 0)
    }

    fn delete(&self, symbol: &str) -> Result<bool, TrailguardError> {
        let changed = self
            .client
            .borrow_mut()
            .execute("DELETE FROM positions WHERE symbol = $1", &[&symbol])
            .map_err(query_error)?;
        Ok(changed > 0)
    }

    fn list(&self) -> Result<Vec<Position>, TrailguardError> {
        let rows = self
            .client
            .borrow_mut()
            .query(
                format!("SELECT {COLUMNS} FROM positions ORDER BY symbol").as_str(),
                &[],
            )
            .map_err(query_error)?;
        rows.iter().map(row_to_position).collect()
    }

    fn clear(&self) -> Result<usize, TrailguardError> {
        let removed = self
            .client
            .borrow_mut()
            .execute("DELETE FROM positions", &[])
            .map_err(query_error)?;
        Ok(removed as usize)
    }
}
