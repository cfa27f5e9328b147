//! Persistence of raw entries.
//!
//! The whole entry list lives in a single slot as serialized JSON.
//! [`EntryStore`] is the seam the rest of the application depends on;
//! [`JsonFileStore`] backs it with a file; test code uses an in-memory
//! slot instead.

pub mod file;
#[cfg(test)]
pub mod memory;

pub use file::JsonFileStore;
#[cfg(test)]
pub use memory::MemoryStore;

use crate::analysis::DecodeError;
use crate::models::Entry;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by an entry store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to serialize entries: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Load/save access to the raw entry list.
pub trait EntryStore {
    /// Load all entries. `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<Entry>>, StoreError>;

    /// Replace the stored list with `entries`.
    fn save(&mut self, entries: &[Entry]) -> Result<(), StoreError>;

    /// Remove the stored list entirely.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Serialize entries the way every store writes them.
pub fn encode_entries(entries: &[Entry]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(entries)?)
}
