//! Write-side operations on the raw entry list.
//!
//! Loading never fails: problems with the stored payload are turned into a
//! [`Notice`] and the application continues with an empty list.

use crate::models::Entry;
use crate::store::EntryStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors raised by ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("a name is required")]
    MissingName,

    #[error("no entries found for {name} on {date}")]
    NotFound { name: String, date: NaiveDate },

    #[error("confirmation code does not match, nothing was deleted")]
    ConfirmationMismatch,
}

/// Which prior entries a new submission replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Replace entries with the same name and date.
    #[default]
    NameAndDate,
    /// Replace every entry with the same name, whatever its date.
    Name,
}

impl ReplacePolicy {
    fn replaces(&self, existing: &Entry, incoming: &Entry) -> bool {
        match self {
            ReplacePolicy::NameAndDate => existing.has_key(&incoming.name, incoming.date),
            ReplacePolicy::Name => existing.name == incoming.name,
        }
    }
}

/// User-facing message produced while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Nothing has been stored yet.
    NoData,
    /// The stored list decoded but holds no entries.
    NoValidData,
    /// The stored list could not be read.
    ReadFailed(String),
}

impl Notice {
    /// Returns true for notices reporting a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::ReadFailed(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoData => write!(f, "No data yet, add some entries first"),
            Notice::NoValidData => write!(f, "Stored data holds no valid entries"),
            Notice::ReadFailed(reason) => write!(f, "Failed to read data: {}", reason),
        }
    }
}

/// Entries loaded from a store, with an optional notice for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub entries: Vec<Entry>,
    pub notice: Option<Notice>,
}

/// Load entries, falling back to an empty list on any failure.
pub fn load_entries<S: EntryStore + ?Sized>(store: &S) -> Loaded {
    let (entries, notice) = match store.load() {
        Ok(Some(entries)) if entries.is_empty() => (entries, Some(Notice::NoValidData)),
        Ok(Some(entries)) => (entries, None),
        Ok(None) => (Vec::new(), Some(Notice::NoData)),
        Err(e) => {
            error!("Failed to read stored entries: {}", e);
            (Vec::new(), Some(Notice::ReadFailed(e.to_string())))
        }
    };

    if let Some(ref notice) = notice {
        if !notice.is_error() {
            info!("{}", notice);
        }
    }

    Loaded { entries, notice }
}

/// Add `entry` to the list, dropping prior entries the policy replaces.
///
/// The name is trimmed and must not be empty.
pub fn submit(
    entries: &[Entry],
    mut entry: Entry,
    policy: ReplacePolicy,
) -> Result<Vec<Entry>, LedgerError> {
    entry.name = entry.name.trim().to_string();
    if entry.name.is_empty() {
        return Err(LedgerError::MissingName);
    }

    let mut updated: Vec<Entry> = entries
        .iter()
        .filter(|existing| !policy.replaces(existing, &entry))
        .cloned()
        .collect();

    let replaced = entries.len() - updated.len();
    if replaced > 0 {
        info!(
            "Replacing {} prior entries for {} ({:?})",
            replaced, entry.name, policy
        );
    }

    updated.push(entry);
    Ok(updated)
}

/// Remove every entry with the given `(name, date)` key.
///
/// Returns the remaining entries and how many were removed.
pub fn delete(entries: &[Entry], name: &str, date: NaiveDate) -> (Vec<Entry>, usize) {
    let remaining: Vec<Entry> = entries
        .iter()
        .filter(|e| !e.has_key(name, date))
        .cloned()
        .collect();
    let removed = entries.len() - remaining.len();
    (remaining, removed)
}

/// Delete an entry key from the store.
pub fn delete_from_store<S: EntryStore + ?Sized>(
    store: &mut S,
    name: &str,
    date: NaiveDate,
) -> anyhow::Result<usize> {
    let loaded = load_entries(&*store);
    if let Some(Notice::ReadFailed(reason)) = loaded.notice {
        anyhow::bail!("cannot delete, stored data is unreadable: {}", reason);
    }

    let (remaining, removed) = delete(&loaded.entries, name, date);
    if removed == 0 {
        return Err(LedgerError::NotFound {
            name: name.to_string(),
            date,
        }
        .into());
    }

    store.save(&remaining)?;
    info!("Deleted {} entries for {} on {}", removed, name, date);
    Ok(removed)
}

/// Delete all stored data if `code` matches `expected`.
pub fn clear_all<S: EntryStore + ?Sized>(
    store: &mut S,
    code: &str,
    expected: &str,
) -> anyhow::Result<()> {
    if code != expected {
        warn!("Clear requested with a wrong confirmation code");
        return Err(LedgerError::ConfirmationMismatch.into());
    }

    store.clear()?;
    info!("All stored data deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(name: &str, date: &str, websites: u64) -> Entry {
        Entry {
            websites,
            ..Entry::new(name, day(date))
        }
    }

    #[test]
    fn test_load_no_data() {
        let store = MemoryStore::new(day("2024-06-01"));
        let loaded = load_entries(&store);
        assert!(loaded.entries.is_empty());
        assert_eq!(loaded.notice, Some(Notice::NoData));
    }

    #[test]
    fn test_load_empty_list_is_distinct_notice() {
        let store = MemoryStore::with_text("[]", day("2024-06-01"));
        let loaded = load_entries(&store);
        assert_eq!(loaded.notice, Some(Notice::NoValidData));
        assert!(!loaded.notice.unwrap().is_error());
    }

    #[test]
    fn test_load_failure_falls_back_to_empty() {
        let store = MemoryStore::with_text("\"just a string\"", day("2024-06-01"));
        let loaded = load_entries(&store);
        assert!(loaded.entries.is_empty());
        assert!(matches!(loaded.notice, Some(Notice::ReadFailed(_))));
        assert!(loaded.notice.unwrap().is_error());
    }

    #[test]
    fn test_submit_requires_name() {
        let err = submit(&[], entry("   ", "2024-01-01", 1), ReplacePolicy::default());
        assert_eq!(err, Err(LedgerError::MissingName));
    }

    #[test]
    fn test_submit_trims_and_appends() {
        let updated = submit(
            &[],
            entry("  Ana ", "2024-01-01", 1),
            ReplacePolicy::default(),
        )
        .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].name, "Ana");
    }

    #[test]
    fn test_submit_replaces_same_name_and_date() {
        let existing = vec![
            entry("Ana", "2024-01-01", 1),
            entry("Ana", "2024-01-02", 2),
            entry("Bo", "2024-01-01", 3),
        ];

        let updated = submit(
            &existing,
            entry("Ana", "2024-01-01", 9),
            ReplacePolicy::NameAndDate,
        )
        .unwrap();

        assert_eq!(updated.len(), 3);
        assert_eq!(updated[0], entry("Ana", "2024-01-02", 2));
        assert_eq!(updated[2], entry("Ana", "2024-01-01", 9));
    }

    #[test]
    fn test_submit_replaces_by_name_only() {
        let existing = vec![
            entry("Ana", "2024-01-01", 1),
            entry("Ana", "2024-01-02", 2),
            entry("Bo", "2024-01-01", 3),
        ];

        let updated =
            submit(&existing, entry("Ana", "2024-01-05", 9), ReplacePolicy::Name).unwrap();
        assert_eq!(
            updated,
            vec![entry("Bo", "2024-01-01", 3), entry("Ana", "2024-01-05", 9)]
        );
    }

    #[test]
    fn test_delete_removes_all_duplicates_of_key() {
        let existing = vec![
            entry("Ana", "2024-01-01", 1),
            entry("Ana", "2024-01-01", 2),
            entry("Ana", "2024-01-02", 3),
        ];

        let (remaining, removed) = delete(&existing, "Ana", day("2024-01-01"));
        assert_eq!(removed, 2);
        assert_eq!(remaining, vec![entry("Ana", "2024-01-02", 3)]);
    }

    #[test]
    fn test_delete_from_store_not_found() {
        let mut store = MemoryStore::new(day("2024-06-01"));
        store.save(&[entry("Ana", "2024-01-01", 1)]).unwrap();

        let err = delete_from_store(&mut store, "Bo", day("2024-01-01")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::NotFound { .. })
        ));
        assert_eq!(load_entries(&store).entries.len(), 1);
    }

    #[test]
    fn test_delete_from_store_saves_remaining() {
        let mut store = MemoryStore::new(day("2024-06-01"));
        store
            .save(&[entry("Ana", "2024-01-01", 1), entry("Bo", "2024-01-01", 2)])
            .unwrap();

        let removed = delete_from_store(&mut store, "Ana", day("2024-01-01")).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(load_entries(&store).entries, vec![entry("Bo", "2024-01-01", 2)]);
    }

    #[test]
    fn test_clear_all_wrong_code_keeps_data() {
        let mut store = MemoryStore::new(day("2024-06-01"));
        store.save(&[entry("Ana", "2024-01-01", 1)]).unwrap();

        let err = clear_all(&mut store, "000", "923").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::ConfirmationMismatch)
        );
        assert!(store.raw().is_some());

        clear_all(&mut store, "923", "923").unwrap();
        assert!(store.raw().is_none());
    }
}
