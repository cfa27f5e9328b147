//! Entry aggregation and statistics.
//!
//! This module folds raw entries into per-person, per-day records and
//! computes the derived metrics, summaries and chart data shown on the
//! dashboard. Everything here is a pure function of its inputs.

use crate::models::{
    add_amount, Attainment, ChartPoint, Classification, DashboardView, Entry, EntryPreview,
    MergedRecord, Metrics, RecordFilter, SortConfig, SortDirection, SortKey, Standards,
    SummaryStats, Tally, ViewQuery, ViewRow,
};
use chrono::{NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::hash_map::Entry as Slot;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Merge entries sharing the same `(name, date)` key.
///
/// Counters are summed; records come out in first-seen key order.
pub fn merge(entries: &[Entry]) -> Vec<MergedRecord> {
    let mut index: HashMap<(&str, NaiveDate), usize> = HashMap::new();
    let mut merged: Vec<MergedRecord> = Vec::new();

    for entry in entries {
        match index.entry((entry.name.as_str(), entry.date)) {
            Slot::Occupied(slot) => merged[*slot.get()].absorb(entry),
            Slot::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(MergedRecord::from(entry));
            }
        }
    }

    debug!("Merged {} entries into {} records", entries.len(), merged.len());
    merged
}

/// Keep the records matching every active predicate of `filter`.
pub fn filter(records: &[MergedRecord], filter: &RecordFilter) -> Vec<MergedRecord> {
    let needle = filter.name_query().map(str::to_lowercase);

    records
        .iter()
        .filter(|r| filter.date.map_or(true, |date| r.date == date))
        .filter(|r| {
            needle
                .as_deref()
                .map_or(true, |needle| r.name.to_lowercase().contains(needle))
        })
        .cloned()
        .collect()
}

/// Compute conversion rate and AC ratio. A zero denominator yields 0.
pub fn derive_metrics<T: Tally>(record: &T) -> Metrics {
    Metrics {
        cr: percentage(record.orders(), record.websites()),
        ac_ratio: percentage(record.ac_count(), record.main_products()),
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Order records by the given sort, or keep input order when unset.
pub fn sort_records(records: &[MergedRecord], sort: Option<SortConfig>) -> Vec<MergedRecord> {
    let mut sorted = records.to_vec();

    if let Some(config) = sort {
        sorted.sort_by(|a, b| {
            let ordering = compare_by(a, b, config.key);
            match config.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    sorted
}

fn compare_by(a: &MergedRecord, b: &MergedRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::Websites => a.websites.cmp(&b.websites),
        SortKey::Orders => a.orders.cmp(&b.orders),
        SortKey::MainProducts => a.main_products.cmp(&b.main_products),
        SortKey::AcCount => a.ac_count.cmp(&b.ac_count),
        SortKey::TbtAmount => a.tbt_amount.total_cmp(&b.tbt_amount),
        SortKey::Cr => derive_metrics(a).cr.total_cmp(&derive_metrics(b).cr),
        SortKey::Ac => derive_metrics(a)
            .ac_ratio
            .total_cmp(&derive_metrics(b).ac_ratio),
    }
}

/// Totals and averages over `records`. An empty set summarizes to zeros.
pub fn summarize(records: &[MergedRecord]) -> SummaryStats {
    let mut summary = SummaryStats {
        total_users: records.len(),
        ..SummaryStats::default()
    };

    let mut cr_sum = 0.0;
    let mut ac_sum = 0.0;

    for record in records {
        summary.total_websites = summary.total_websites.saturating_add(record.websites);
        summary.total_orders = summary.total_orders.saturating_add(record.orders);
        summary.total_main_products = summary
            .total_main_products
            .saturating_add(record.main_products);
        summary.total_ac = summary.total_ac.saturating_add(record.ac_count);
        summary.total_amount = add_amount(summary.total_amount, record.tbt_amount);

        let metrics = derive_metrics(record);
        cr_sum += metrics.cr;
        ac_sum += metrics.ac_ratio;
    }

    let divisor = records.len().max(1) as f64;
    summary.avg_cr = cr_sum / divisor;
    summary.avg_ac = ac_sum / divisor;
    summary.avg_amount = summary.total_amount / divisor;

    summary
}

/// Check a record against the standards. Meeting a threshold exactly counts.
pub fn classify<T: Tally>(record: &T, standards: &Standards) -> Classification {
    let metrics = derive_metrics(record);
    Classification {
        cr_met: metrics.cr >= standards.cr,
        ac_met: metrics.ac_ratio >= standards.ac,
        amount_met: record.tbt_amount() >= standards.tbt,
    }
}

/// Totals of the four counters as chart bars.
pub fn bar_chart(summary: &SummaryStats) -> Vec<ChartPoint> {
    counter_bars(
        summary.total_websites,
        summary.total_orders,
        summary.total_main_products,
        summary.total_ac,
    )
}

fn counter_bars(websites: u64, orders: u64, main_products: u64, ac: u64) -> Vec<ChartPoint> {
    vec![
        ChartPoint::new("Websites", websites as f64),
        ChartPoint::new("Orders", orders as f64),
        ChartPoint::new("Main products", main_products as f64),
        ChartPoint::new("AC", ac as f64),
    ]
}

/// Count records meeting and missing the CR standard.
pub fn cr_attainment(records: &[MergedRecord], standards: &Standards) -> Attainment {
    let met = records
        .iter()
        .filter(|r| derive_metrics(*r).cr >= standards.cr)
        .count();

    Attainment {
        met,
        missed: records.len() - met,
    }
}

/// Metrics and chart data for one entry before it is merged with others.
pub fn entry_preview(entry: &Entry) -> EntryPreview {
    let metrics = derive_metrics(entry);
    EntryPreview {
        metrics,
        converted: metrics.cr,
        unconverted: (100.0 - metrics.cr).max(0.0),
        bars: counter_bars(
            entry.websites,
            entry.orders,
            entry.main_products,
            entry.ac_count,
        ),
    }
}

/// Distinct names in first-seen order, narrowed to those containing `query`
/// (case-insensitive) when it is non-empty.
pub fn name_suggestions(entries: &[Entry], query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    let mut seen = HashSet::new();

    entries
        .iter()
        .map(|e| e.name.as_str())
        .filter(|name| seen.insert(*name))
        .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
        .map(String::from)
        .collect()
}

/// Run the whole pipeline: merge, filter, sort, summarize, classify.
///
/// The summary and chart data cover the filtered set.
pub fn build_view(entries: &[Entry], query: &ViewQuery, standards: &Standards) -> DashboardView {
    let merged = merge(entries);
    let filtered = filter(&merged, &query.filter);
    let summary = summarize(&filtered);
    let attainment = cr_attainment(&filtered, standards);

    let rows = sort_records(&filtered, query.sort)
        .into_iter()
        .map(|record| ViewRow {
            metrics: derive_metrics(&record),
            classification: classify(&record, standards),
            record,
        })
        .collect();

    DashboardView {
        generated_at: Utc::now(),
        query: query.clone(),
        standards: *standards,
        bar_chart: bar_chart(&summary),
        summary,
        rows,
        cr_attainment: attainment,
    }
}
