//! JSON snapshot encoding.
//!
//! The snapshot is the store state flattened next to a `version` field.
//! Readers ignore the version; schema migration belongs to the adapter.

use crate::persist::{PersistError, PersistResult};
use crate::store::StoreState;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    #[serde(flatten)]
    state: &'a StoreState,
}

#[derive(Deserialize)]
struct SnapshotIn {
    #[serde(default)]
    #[allow(dead_code)]
    version: u32,
    #[serde(flatten)]
    state: StoreState,
}

fn envelope(state: &StoreState) -> SnapshotOut<'_> {
    SnapshotOut {
        version: SNAPSHOT_VERSION,
        state,
    }
}

/// Compact JSON used for routine saves.
pub fn encode(state: &StoreState) -> PersistResult<String> {
    serde_json::to_string(&envelope(state)).map_err(PersistError::Encode)
}

/// Indented JSON used for user-facing exports.
pub fn encode_pretty(state: &StoreState) -> PersistResult<String> {
    serde_json::to_string_pretty(&envelope(state)).map_err(PersistError::Encode)
}

pub fn decode(text: &str) -> PersistResult<StoreState> {
    let snapshot: SnapshotIn = serde_json::from_str(text).map_err(PersistError::Decode)?;
    Ok(snapshot.state)
}

/// Writes a pretty snapshot to `path`, replacing any existing file.
///
/// Returns the written text.
pub fn export_to_path(state: &StoreState, path: impl AsRef<Path>) -> PersistResult<String> {
    let text = encode_pretty(state)?;
    std::fs::write(path, &text)?;
    Ok(text)
}

pub fn import_from_path(path: impl AsRef<Path>) -> PersistResult<StoreState> {
    let text = std::fs::read_to_string(path)?;
    decode(&text)
}
