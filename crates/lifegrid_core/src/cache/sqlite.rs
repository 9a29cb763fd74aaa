//! SQLite-backed durable cache.
//!
//! # Invariants
//! - Each call runs as a single statement; no transaction spans calls.
//! - `set` overwrites existing values (upsert).

use super::{CacheResult, LocalCache};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Durable cache stored in the `local_cache` table.
pub struct SqliteLocalCache {
    conn: Mutex<Connection>,
}

impl SqliteLocalCache {
    /// Opens the cache file at `path`, creating and migrating it as needed.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already has migrations applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl LocalCache for SqliteLocalCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = self
            .conn
            .lock()
            .query_row(
                "SELECT cache_value FROM local_cache WHERE cache_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.conn.lock().execute(
            "INSERT INTO local_cache (cache_key, cache_value) VALUES (?1, ?2)
             ON CONFLICT(cache_key) DO UPDATE SET
                cache_value = excluded.cache_value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        debug!("event=cache_set module=cache status=ok key={key}");
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM local_cache WHERE cache_key = ?1;", [key])?;
        debug!("event=cache_remove module=cache status=ok key={key}");
        Ok(())
    }
}
