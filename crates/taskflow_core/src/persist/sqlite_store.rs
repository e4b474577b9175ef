//! SQLite snapshot adapter.
//!
//! # Invariants
//! - The connection must come from `open_db`/`open_db_in_memory` so the
//!   `kv_snapshots` and `snapshot_exports` tables exist.
//! - `save` is an upsert; one row per key.

use crate::db::migrations::latest_version;
use crate::model::EpochMs;
use crate::persist::{PersistResult, SnapshotStore};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqliteSnapshotStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Export timestamps recorded for `key`, newest first.
    pub fn export_history(&self, key: &str) -> PersistResult<Vec<EpochMs>> {
        let mut stmt = self.conn.prepare(
            "SELECT exported_at
             FROM snapshot_exports
             WHERE key = ?1
             ORDER BY exported_at DESC, id DESC;",
        )?;
        let rows = stmt.query_map([key], |row| row.get::<_, i64>(0))?;
        let mut history = Vec::new();
        for row in rows {
            history.push(row?);
        }
        Ok(history)
    }
}

impl SnapshotStore for SqliteSnapshotStore<'_> {
    fn load(&self, key: &str) -> PersistResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_snapshots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        debug!(
            "event=snapshot_read module=persist status=ok schema_version={} found={}",
            latest_version(),
            value.is_some()
        );
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> PersistResult<()> {
        let result = self.conn.execute(
            "INSERT INTO kv_snapshots (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        );
        if let Err(err) = &result {
            error!(
                "event=snapshot_write module=persist status=error bytes={} error={}",
                value.len(),
                err
            );
        }
        result?;
        Ok(())
    }

    fn archive(&mut self, key: &str, value: &str, at: EpochMs) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO snapshot_exports (key, value, exported_at) VALUES (?1, ?2, ?3);",
            params![key, value, at],
        )?;
        Ok(())
    }
}
