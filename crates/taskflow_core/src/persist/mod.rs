//! Snapshot persistence boundary.
//!
//! # Responsibility
//! - Define the key-value adapter contract the workspace service writes to.
//! - Encode/decode the full store state as an opaque JSON snapshot.
//! - Provide SQLite-backed and in-memory adapters.
//!
//! # Invariants
//! - `decode(encode(state)) == state`.
//! - Adapters store snapshot text verbatim and never interpret it.

pub mod memory_store;
pub mod snapshot;
pub mod sqlite_store;

use crate::db::DbError;
use crate::model::EpochMs;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug)]
pub enum PersistError {
    Db(DbError),
    Encode(serde_json::Error),
    Decode(serde_json::Error),
    Io(std::io::Error),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::Decode(err) => write!(f, "failed to decode snapshot: {err}"),
            Self::Io(err) => write!(f, "snapshot file error: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) | Self::Decode(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for PersistError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Key-value persistence adapter for serialized snapshots.
pub trait SnapshotStore {
    /// Returns the stored snapshot for `key`, if any.
    fn load(&self, key: &str) -> PersistResult<Option<String>>;

    /// Replaces the stored snapshot for `key`.
    fn save(&mut self, key: &str, value: &str) -> PersistResult<()>;

    /// Keeps a copy of an exported snapshot. Adapters without history
    /// accept and drop it.
    fn archive(&mut self, _key: &str, _value: &str, _at: EpochMs) -> PersistResult<()> {
        Ok(())
    }
}
