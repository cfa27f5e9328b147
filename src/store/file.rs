//! JSON file backed entry store.

use super::{encode_entries, EntryStore, StoreError};
use crate::analysis::decode_entries;
use crate::models::Entry;
use chrono::{Local, NaiveDate};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Entry store persisting the list in one JSON file.
///
/// A missing file means no data has been stored yet. Saves go through a
/// temporary file in the same directory that is renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    today: NaiveDate,
}

impl JsonFileStore {
    /// Creates a store for `path`, using the local date as the fallback
    /// for undated entries.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            today: Local::now().date_naive(),
        }
    }

    /// Overrides the fallback date for undated entries.
    #[cfg(test)]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Path of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl EntryStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Entry>>, StoreError> {
        if !self.path.exists() {
            debug!("No data file at {}", self.path.display());
            return Ok(None);
        }

        let text = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let entries = decode_entries(&text, self.today)?;

        debug!(
            "Loaded {} entries from {}",
            entries.len(),
            self.path.display()
        );
        Ok(Some(entries))
    }

    fn save(&mut self, entries: &[Entry]) -> Result<(), StoreError> {
        let content = encode_entries(entries)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        temp.write_all(content.as_bytes()).map_err(|e| self.io_error(e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        info!("Saved {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed data file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
