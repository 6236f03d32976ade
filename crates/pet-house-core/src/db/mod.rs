//! Database layer for pet-house.

mod appointments;
mod audit;
mod boarding;
mod medical;
mod notifications;
mod pets;
mod profiles;
mod schema;

pub use appointments::*;
pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::models::parse_timestamp;
use crate::notify::NotifyHub;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
///
/// Notification inserts are published to the attached hub after they commit.
pub struct Database {
    conn: Connection,
    hub: Arc<NotifyHub>,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, Arc::new(NotifyHub::new()))
    }

    /// Open the configured database file with the configured busy timeout.
    pub fn open_with_config(config: &Config, hub: Arc<NotifyHub>) -> DbResult<Self> {
        let conn = Connection::open(&config.database_path)?;
        conn.busy_timeout(config.busy_timeout)?;
        Self::from_connection(conn, hub)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, Arc::new(NotifyHub::new()))
    }

    fn from_connection(conn: Connection, hub: Arc<NotifyHub>) -> DbResult<Self> {
        let db = Self { conn, hub };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Hub that receives notification inserts.
    pub fn notify_hub(&self) -> &Arc<NotifyHub> {
        &self.hub
    }

    /// Run `f` under one `BEGIN IMMEDIATE` write transaction.
    ///
    /// Commits when `f` returns `Ok`; an `Err` rolls back everything `f`
    /// wrote. Nested calls join the transaction already open.
    pub fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<DbError>,
    {
        if !self.conn.is_autocommit() {
            return f();
        }
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = f()?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

/// Parse a stored timestamp column.
pub(crate) fn column_instant(value: &str) -> DbResult<DateTime<Utc>> {
    parse_timestamp(value).ok_or_else(|| DbError::InvalidTimestamp(value.to_string()))
}

/// Parse a nullable stored timestamp column.
pub(crate) fn column_instant_opt(value: Option<String>) -> DbResult<Option<DateTime<Utc>>> {
    value.as_deref().map(column_instant).transpose()
}
