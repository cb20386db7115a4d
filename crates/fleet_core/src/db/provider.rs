//! Connection provider seam between repositories and storage configuration.
//!
//! # Responsibility
//! - Yield one ready connection per repository operation.
//! - Verify the schema shape repositories decode against.
//!
//! # Invariants
//! - A connection is released when the value returned by `connection()` drops.
//! - The first connection handed out by `SqliteConnectionProvider` runs
//!   migrations and `ensure_schema_ready`; later ones only apply pragmas.

use super::open::{open_configured, open_db_with_timeout, DEFAULT_BUSY_TIMEOUT};
use super::{DbError, DbResult};
use log::info;
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Tables and columns the car repository reads or writes.
const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("manufacturers", &["id", "name", "country"]),
    ("drivers", &["id", "name", "license_number", "is_deleted"]),
    ("cars", &["id", "model", "manufacturer_id", "is_deleted"]),
    ("cars_drivers", &["car_id", "driver_id"]),
];

/// Source of live database connections.
pub trait ConnectionProvider {
    /// Acquires a connection to the configured database.
    fn connection(&self) -> DbResult<Connection>;
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    fn connection(&self) -> DbResult<Connection> {
        (**self).connection()
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for Arc<P> {
    fn connection(&self) -> DbResult<Connection> {
        (**self).connection()
    }
}

/// Opens a fresh connection to one SQLite database file per call.
///
/// Schema verification happens once per provider; clones share the result
/// observed so far.
#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    path: PathBuf,
    busy_timeout: Duration,
    schema_verified: OnceCell<()>,
}

impl SqliteConnectionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            schema_verified: OnceCell::new(),
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a connection from this provider already passed schema checks.
    pub fn is_schema_verified(&self) -> bool {
        self.schema_verified.get().is_some()
    }

    fn verified_connection(&self) -> DbResult<Connection> {
        let conn = open_db_with_timeout(&self.path, self.busy_timeout)?;
        ensure_schema_ready(&conn)?;
        info!(
            "event=schema_verify module=db status=ok path={}",
            self.path.display()
        );
        Ok(conn)
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    fn connection(&self) -> DbResult<Connection> {
        if self.is_schema_verified() {
            return open_configured(&self.path, self.busy_timeout);
        }

        let conn = self.verified_connection()?;
        let _ = self.schema_verified.set(());
        Ok(conn)
    }
}

/// Checks that every table and column the repositories rely on exists.
///
/// # Errors
/// - `MissingRequiredTable` / `MissingRequiredColumn` for the first gap found.
pub fn ensure_schema_ready(conn: &Connection) -> DbResult<()> {
    for &(table, columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(DbError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{ensure_schema_ready, ConnectionProvider, SqliteConnectionProvider};
    use crate::db::{open_db_in_memory, DbError};
    use rusqlite::Connection;

    #[test]
    fn migrated_connection_is_ready() {
        let conn = open_db_in_memory().unwrap();
        ensure_schema_ready(&conn).unwrap();
    }

    #[test]
    fn empty_connection_reports_first_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let err = ensure_schema_ready(&conn).unwrap_err();
        assert!(matches!(err, DbError::MissingRequiredTable("manufacturers")));
    }

    #[test]
    fn missing_soft_delete_column_is_reported() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "DROP TABLE cars_drivers;
             DROP TABLE drivers;
             CREATE TABLE drivers (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                license_number TEXT NOT NULL
             );",
        )
        .unwrap();

        let err = ensure_schema_ready(&conn).unwrap_err();
        assert!(matches!(
            err,
            DbError::MissingRequiredColumn {
                table: "drivers",
                column: "is_deleted"
            }
        ));
    }

    #[test]
    fn schema_is_verified_once_per_provider() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteConnectionProvider::new(dir.path().join("fleet.db"));
        assert!(!provider.is_schema_verified());

        drop(provider.connection().unwrap());
        assert!(provider.is_schema_verified());

        let later = provider.connection().unwrap();
        let foreign_keys: i64 = later
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn failed_verification_is_retried_on_next_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("PRAGMA user_version = 999;")
            .unwrap();
        let provider = SqliteConnectionProvider::new(&path);

        assert!(provider.connection().is_err());
        assert!(!provider.is_schema_verified());
        assert!(provider.connection().is_err());
    }
}
