//! In-memory entry store.

use super::{encode_entries, EntryStore, StoreError};
use crate::analysis::decode_entries;
use crate::models::Entry;
use chrono::NaiveDate;

/// Store keeping the serialized slot in memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    slot: Option<String>,
    today: NaiveDate,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new(today: NaiveDate) -> Self {
        Self { slot: None, today }
    }

    /// Creates a store whose slot already holds `text`.
    pub fn with_text(text: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            slot: Some(text.into()),
            today,
        }
    }

    /// Returns the raw slot contents.
    pub fn raw(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl EntryStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Entry>>, StoreError> {
        match self.slot {
            Some(ref text) => Ok(Some(decode_entries(text, self.today)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, entries: &[Entry]) -> Result<(), StoreError> {
        self.slot = Some(encode_entries(entries)?);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DecodeError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_memory_store_empty() {
        let store = MemoryStore::new(today());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_save_then_load() {
        let mut store = MemoryStore::new(today());
        let mut entry = Entry::new("A", today());
        entry.orders = 4;

        store.save(&[entry.clone()]).unwrap();
        assert!(store.raw().unwrap().contains("\"orders\": 4"));
        assert_eq!(store.load().unwrap(), Some(vec![entry]));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_malformed_slot() {
        let store = MemoryStore::with_text("not json", today());
        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Decode(DecodeError::Malformed(_))));
    }
}
