//! SQLite position store.
//!
//! One row per open position, keyed by symbol. Timestamps are stored as
//! RFC 3339 text; direction and strength as their display labels.

use crate::domain::error::TrailguardError;
use crate::domain::position::Position;
use crate::ports::config_port::ConfigPort;
use crate::ports::position_store_port::PositionStorePort;
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};

const COLUMNS: &str = "symbol, entry_price, direction, strength, max_favorable_price, \
                       opened_at, last_updated_at";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_error(e: rusqlite::Error) -> TrailguardError {
    TrailguardError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn conversion_error(idx: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        reason.into(),
    )
}

fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e.to_string()))
}

fn row_to_position(row: &Row<'_>) -> Result<Position, rusqlite::Error> {
    let direction: String = row.get(2)?;
    let strength: String = row.get(3)?;
    let opened_at: String = row.get(5)?;
    let last_updated_at: String = row.get(6)?;

    Ok(Position {
        symbol: row.get(0)?,
        entry_price: row.get(1)?,
        direction: direction.parse().map_err(|e| conversion_error(2, e))?,
        strength: strength.parse().map_err(|e| conversion_error(3, e))?,
        max_favorable_price: row.get(4)?,
        opened_at: parse_timestamp(5, &opened_at)?,
        last_updated_at: parse_timestamp(6, &last_updated_at)?,
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrailguardError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TrailguardError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| TrailguardError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TrailguardError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TrailguardError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TrailguardError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| TrailguardError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), TrailguardError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS positions (
                    symbol TEXT PRIMARY KEY,
                    entry_price REAL NOT NULL,
                    direction TEXT NOT NULL,
                    strength TEXT NOT NULL,
                    max_favorable_price REAL NOT NULL,
                    opened_at TEXT NOT NULL,
                    last_updated_at TEXT NOT NULL
                );",
            )
            .map_err(query_error)
    }
}

impl PositionStorePort for SqliteAdapter {
    fn get(&self, symbol: &str) -> Result<Option<Position>, TrailguardError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM positions WHERE symbol = ?1"),
            params![symbol],
            row_to_position,
        )
        .optional()
        .map_err(query_error)
    }

    fn upsert(&self, position: &Position) -> Result<(), TrailguardError> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT OR REPLACE INTO positions ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                position.symbol,
                position.entry_price,
                position.direction.to_string(),
                position.strength.to_string(),
                position.max_favorable_price,
                position.opened_at.to_rfc3339(),
                position.last_updated_at.to_rfc3339(),
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
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE positions SET max_favorable_price = ?1, last_updated_at = ?2 \
                 WHERE symbol = ?3",
                params![price, at.to_rfc3339(), symbol],
            )
            .map_err(query_error)?;
        Ok(changed > 0)
    }

    fn delete(&self, symbol: &str) -> Result<bool, TrailguardError> {
        let conn = self.conn()?;
        let changed = conn
            .execute("DELETE FROM positions WHERE symbol = ?1", params![symbol])
            .map_err(query_error)?;
        Ok(changed > 0)
    }

    fn list(&self) -> Result<Vec<Position>, TrailguardError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {COLUMNS} FROM positions ORDER BY symbol"))
            .map_err(query_error)?;

        let rows = stmt.query_map([], row_to_position).map_err(query_error)?;

        let mut positions = Vec::new();
        for row in rows {
            positions.push(row.map_err(query_error)?);
        }
        Ok(positions)
    }

    fn clear(&self) -> Result<usize, TrailguardError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM positions", [])
            .map_err(query_error)
    }
}
