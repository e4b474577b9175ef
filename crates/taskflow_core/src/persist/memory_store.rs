//! In-process snapshot adapter for tests and throwaway sessions.

use crate::model::EpochMs;
use crate::persist::{PersistResult, SnapshotStore};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    entries: HashMap<String, String>,
    archive: Vec<(String, EpochMs)>,
    saves: u64,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> u64 {
        self.saves
    }

    /// Archived exports as `(key, exported_at)`, oldest first.
    pub fn archived(&self) -> &[(String, EpochMs)] {
        &self.archive
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &str) -> PersistResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> PersistResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.saves += 1;
        Ok(())
    }

    fn archive(&mut self, key: &str, _value: &str, at: EpochMs) -> PersistResult<()> {
        self.archive.push((key.to_string(), at));
        Ok(())
    }
}
