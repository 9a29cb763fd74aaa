//! Durable local key/value cache.
//!
//! # Responsibility
//! - Define the synchronous string key/value contract used for session state.
//! - Provide in-memory and SQLite-backed implementations.
//!
//! # Invariants
//! - Every operation completes synchronously within the calling action.
//! - `remove` of an absent key is a no-op.
//! - Values are stored verbatim; callers own the encoding.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteLocalCache;

/// Cache key holding the JSON-encoded user record.
pub const USER_KEY: &str = "_user";
/// Cache key holding the raw OAuth id token.
pub const ID_TOKEN_KEY: &str = "_id_token";
/// Cache key holding the raw OAuth access token.
pub const ACCESS_TOKEN_KEY: &str = "_access_token";

pub type CacheResult<T> = Result<T, CacheError>;

/// Local cache failures.
#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    /// A write was rejected by the backing store.
    Unavailable(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "local cache storage error: {err}"),
            Self::Unavailable(message) => write!(f, "local cache unavailable: {message}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Process-local durable string key/value storage.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;
    fn remove(&self, key: &str) -> CacheResult<()>;
}

impl<T: LocalCache + ?Sized> LocalCache for std::sync::Arc<T> {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        (**self).remove(key)
    }
}
