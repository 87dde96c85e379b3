//! SQLite-backed key/value storage for the engine's persistence primitives.

use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension};
use triage_session::{KeyValueStore, StorageError};

/// Durable store behind the engine's `get`/`set`/`remove` primitives,
/// holding the folder progress map and the session snapshot.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (and if necessary creates) the database at `path`
    pub fn open(path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        init_kv_schema(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()?;
        init_kv_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Initialize the key/value schema
fn init_kv_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

fn map_error(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::DiskFull =>
        {
            StorageError::QuotaExceeded
        }
        _ => StorageError::Backend(e.to_string()),
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(map_error)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = CURRENT_TIMESTAMP",
                params![key, value],
            )
            .map(|_| ())
            .map_err(map_error)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map(|_| ())
            .map_err(map_error)
    }
}
