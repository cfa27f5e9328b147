//! Data models for the performance tracker.
//!
//! This module contains the core data structures shared by the
//! aggregation engine, the store, and the report renderers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name used for stored entries that carry no usable name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Read access to the numeric fields shared by raw entries and merged records.
pub trait Tally {
    fn websites(&self) -> u64;
    fn orders(&self) -> u64;
    fn main_products(&self) -> u64;
    fn ac_count(&self) -> u64;
    fn tbt_amount(&self) -> f64;
}

/// One submitted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Person the metrics belong to.
    pub name: String,
    /// Calendar day the metrics were recorded for.
    pub date: NaiveDate,
    /// Website visits.
    pub websites: u64,
    /// Orders placed.
    pub orders: u64,
    /// Main products sold.
    pub main_products: u64,
    /// AC units sold.
    pub ac_count: u64,
    /// Monetary amount.
    pub tbt_amount: f64,
}

impl Entry {
    /// Creates an entry with all counters at zero.
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
            websites: 0,
            orders: 0,
            main_products: 0,
            ac_count: 0,
            tbt_amount: 0.0,
        }
    }

    /// Returns true if this entry belongs to the given merge key.
    pub fn has_key(&self, name: &str, date: NaiveDate) -> bool {
        self.name == name && self.date == date
    }
}

impl Tally for Entry {
    fn websites(&self) -> u64 {
        self.websites
    }
    fn orders(&self) -> u64 {
        self.orders
    }
    fn main_products(&self) -> u64 {
        self.main_products
    }
    fn ac_count(&self) -> u64 {
        self.ac_count
    }
    fn tbt_amount(&self) -> f64 {
        self.tbt_amount
    }
}

/// All entries sharing one `(name, date)` key, folded into a single record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRecord {
    pub name: String,
    pub date: NaiveDate,
    pub websites: u64,
    pub orders: u64,
    pub main_products: u64,
    pub ac_count: u64,
    pub tbt_amount: f64,
    /// Number of raw entries folded into this record.
    pub entry_count: usize,
}

impl MergedRecord {
    /// Adds the counters of another entry with the same key.
    ///
    /// Sums saturate instead of overflowing.
    pub fn absorb(&mut self, entry: &Entry) {
        self.websites = self.websites.saturating_add(entry.websites);
        self.orders = self.orders.saturating_add(entry.orders);
        self.main_products = self.main_products.saturating_add(entry.main_products);
        self.ac_count = self.ac_count.saturating_add(entry.ac_count);
        self.tbt_amount = add_amount(self.tbt_amount, entry.tbt_amount);
        self.entry_count += 1;
    }
}

/// Sum two amounts, capping at `f64::MAX` so totals stay finite.
pub fn add_amount(a: f64, b: f64) -> f64 {
    (a + b).min(f64::MAX)
}

impl From<&Entry> for MergedRecord {
    fn from(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            date: entry.date,
            websites: entry.websites,
            orders: entry.orders,
            main_products: entry.main_products,
            ac_count: entry.ac_count,
            tbt_amount: entry.tbt_amount,
            entry_count: 1,
        }
    }
}

impl Tally for MergedRecord {
    fn websites(&self) -> u64 {
        self.websites
    }
    fn orders(&self) -> u64 {
        self.orders
    }
    fn main_products(&self) -> u64 {
        self.main_products
    }
    fn ac_count(&self) -> u64 {
        self.ac_count
    }
    fn tbt_amount(&self) -> f64 {
        self.tbt_amount
    }
}

/// Thresholds a record is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standards {
    /// Conversion rate threshold, percent.
    #[serde(default = "default_cr")]
    pub cr: f64,
    /// AC ratio threshold, percent.
    #[serde(default = "default_ac")]
    pub ac: f64,
    /// Monetary threshold.
    #[serde(default = "default_tbt")]
    pub tbt: f64,
}

impl Default for Standards {
    fn default() -> Self {
        Self {
            cr: default_cr(),
            ac: default_ac(),
            tbt: default_tbt(),
        }
    }
}

fn default_cr() -> f64 {
    30.0
}

fn default_ac() -> f64 {
    50.0
}

fn default_tbt() -> f64 {
    1000.0
}

/// Derived percentages of a record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Orders per website visit, percent.
    pub cr: f64,
    /// AC count per main product, percent.
    pub ac_ratio: f64,
}

/// Whether a record meets each standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub cr_met: bool,
    pub ac_met: bool,
    pub amount_met: bool,
}

impl Classification {
    /// Returns true if every standard is met.
    pub fn all_met(&self) -> bool {
        self.cr_met && self.ac_met && self.amount_met
    }
}

/// Totals and averages over a set of merged records.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_users: usize,
    pub total_websites: u64,
    pub total_orders: u64,
    pub total_main_products: u64,
    pub total_ac: u64,
    pub total_amount: f64,
    pub avg_cr: f64,
    pub avg_ac: f64,
    pub avg_amount: f64,
}

/// Field a record list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Date,
    Websites,
    Orders,
    MainProducts,
    AcCount,
    TbtAmount,
    /// Derived conversion rate.
    Cr,
    /// Derived AC ratio.
    Ac,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortKey::Name => "name",
            SortKey::Date => "date",
            SortKey::Websites => "websites",
            SortKey::Orders => "orders",
            SortKey::MainProducts => "mainProducts",
            SortKey::AcCount => "acCount",
            SortKey::TbtAmount => "tbtAmount",
            SortKey::Cr => "cr",
            SortKey::Ac => "ac",
        };
        write!(f, "{}", label)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Returns an arrow marker for table headers.
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    /// Creates an ascending sort on `key`.
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }

    /// Selects `key` as the sort column.
    ///
    /// Selecting the active key again flips its direction; a new key
    /// starts ascending.
    #[allow(dead_code)] // Column-click sorting for interactive hosts
    pub fn toggle(current: Option<SortConfig>, key: SortKey) -> Self {
        match current {
            Some(active) if active.key == key => Self {
                key,
                direction: active.direction.flipped(),
            },
            _ => Self::ascending(key),
        }
    }
}

/// Record filter. Unset or empty predicates impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Exact date.
    pub date: Option<NaiveDate>,
}

impl RecordFilter {
    /// Returns the name query if it is set and non-empty.
    pub fn name_query(&self) -> Option<&str> {
        self.name.as_deref().filter(|q| !q.is_empty())
    }

    /// Returns true if any predicate constrains the result.
    pub fn is_active(&self) -> bool {
        self.name_query().is_some() || self.date.is_some()
    }
}

/// Everything the view pipeline needs besides the entries and standards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewQuery {
    pub filter: RecordFilter,
    pub sort: Option<SortConfig>,
}

/// One labelled bar of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// How many records meet or miss the CR standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Attainment {
    pub met: usize,
    pub missed: usize,
}

/// Metrics and chart data for a single entry, shown after submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPreview {
    pub metrics: Metrics,
    /// Converted share of the conversion pie, percent.
    pub converted: f64,
    /// Unconverted share of the conversion pie, percent. Never negative.
    pub unconverted: f64,
    pub bars: Vec<ChartPoint>,
}

/// One table row of the dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub record: MergedRecord,
    pub metrics: Metrics,
    pub classification: Classification,
}

/// The complete view model rendered by the report module.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    pub query: ViewQuery,
    pub standards: Standards,
    pub summary: SummaryStats,
    pub rows: Vec<ViewRow>,
    pub bar_chart: Vec<ChartPoint>,
    pub cr_attainment: Attainment,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_sort_toggle_same_key_flips() {
        let first = SortConfig::toggle(None, SortKey::Cr);
        assert_eq!(first.direction, SortDirection::Asc);

        let second = SortConfig::toggle(Some(first), SortKey::Cr);
        assert_eq!(second.direction, SortDirection::Desc);

        let third = SortConfig::toggle(Some(second), SortKey::Cr);
        assert_eq!(third.direction, SortDirection::Asc);
    }

    #[test]
    fn test_sort_toggle_new_key_resets() {
        let active = SortConfig {
            key: SortKey::Orders,
            direction: SortDirection::Desc,
        };
        let next = SortConfig::toggle(Some(active), SortKey::Name);
        assert_eq!(next, SortConfig::ascending(SortKey::Name));
    }

    #[test]
    fn test_default_standards() {
        let standards = Standards::default();
        assert_eq!(standards.cr, 30.0);
        assert_eq!(standards.ac, 50.0);
        assert_eq!(standards.tbt, 1000.0);
    }

    #[test]
    fn test_absorb_saturates() {
        let mut record = MergedRecord::from(&Entry {
            websites: u64::MAX,
            tbt_amount: f64::MAX,
            ..Entry::new("A", day("2024-01-01"))
        });
        record.absorb(&Entry {
            websites: 5,
            tbt_amount: f64::MAX,
            ..Entry::new("A", day("2024-01-01"))
        });
        assert_eq!(record.websites, u64::MAX);
        assert_eq!(record.tbt_amount, f64::MAX);
        assert_eq!(record.entry_count, 2);
    }

    #[test]
    fn test_absorb_sums_counters() {
        let mut a = Entry::new("A", day("2024-01-01"));
        a.websites = 100;
        a.tbt_amount = 10.5;
        let mut b = a.clone();
        b.websites = 50;
        b.tbt_amount = 4.5;

        let mut merged = MergedRecord::from(&a);
        merged.absorb(&b);
        assert_eq!(merged.websites, 150);
        assert_eq!(merged.tbt_amount, 15.0);
        assert_eq!(merged.entry_count, 2);
        assert_eq!(merged.name, "A");
    }

    #[test]
    fn test_empty_name_query_is_inactive() {
        let filter = RecordFilter {
            name: Some(String::new()),
            date: None,
        };
        assert!(!filter.is_active());
        assert_eq!(filter.name_query(), None);
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = Entry::new("A", day("2024-01-01"));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"mainProducts\""));
        assert!(json.contains("\"tbtAmount\""));
        assert!(json.contains("\"2024-01-01\""));
    }
}
