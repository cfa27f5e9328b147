//! Dashboard report generation.
//!
//! This module renders a [`DashboardView`] as a terminal table, a
//! Markdown document or JSON, and renders the preview shown after an
//! entry is added.

use crate::config::{ReportConfig, ReportFormat};
use crate::models::{ChartPoint, DashboardView, Entry, EntryPreview, SummaryStats, ViewRow};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Render the view in the configured format.
pub fn render_report(view: &DashboardView, options: &ReportConfig) -> Result<String> {
    match options.format {
        ReportFormat::Table => Ok(generate_table_report(view, options)),
        ReportFormat::Markdown => Ok(generate_markdown_report(view, options)),
        ReportFormat::Json => generate_json_report(view),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(view: &DashboardView, options: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# Performance Report\n\n");
    output.push_str(&generate_metadata_section(view));
    output.push_str(&generate_summary_section(&view.summary, options.decimals));
    output.push_str(&generate_charts_section(view, options));
    output.push_str(&generate_records_section(&view.rows, &view.summary, options.decimals));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(view: &DashboardView) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        view.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let filter = &view.query.filter;
    if !filter.is_active() {
        section.push_str("- **Filter:** none\n");
    }
    if let Some(name) = filter.name_query() {
        section.push_str(&format!("- **Name contains:** {}\n", escape_cell(name)));
    }
    if let Some(date) = filter.date {
        section.push_str(&format!("- **Date:** {}\n", date));
    }
    if let Some(sort) = view.query.sort {
        section.push_str(&format!(
            "- **Sorted by:** {} {}\n",
            sort.key,
            sort.direction.arrow()
        ));
    }

    section.push_str(&format!(
        "- **Standards:** CR ≥ {}% | AC ≥ {}% | Amount ≥ {}\n",
        view.standards.cr,
        view.standards.ac,
        format_amount(view.standards.tbt)
    ));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &SummaryStats, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| People | Websites | Orders | Main products | AC | Avg CR | Avg AC | Total amount | Avg amount |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n\n",
        summary.total_users,
        summary.total_websites,
        summary.total_orders,
        summary.total_main_products,
        summary.total_ac,
        format_percent(summary.avg_cr, decimals),
        format_percent(summary.avg_ac, decimals),
        format_amount(summary.total_amount),
        format_amount(summary.avg_amount),
    ));

    section
}

/// Generate the chart section: counter totals and CR attainment.
fn generate_charts_section(view: &DashboardView, options: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Charts\n\n");
    section.push_str("### Totals\n\n```\n");
    section.push_str(&render_bars(&view.bar_chart, options.bar_width));
    section.push_str("```\n\n");

    let attainment = view.cr_attainment;
    section.push_str("### CR Attainment\n\n");
    section.push_str("| Met | Missed |\n");
    section.push_str("|:---:|:---:|\n");
    section.push_str(&format!("| {} | {} |\n\n", attainment.met, attainment.missed));

    section
}

/// Generate the records table with a summary row on top.
fn generate_records_section(rows: &[ViewRow], summary: &SummaryStats, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("## Records\n\n");

    if rows.is_empty() {
        section.push_str("No records to show. Add entries with `perftrack add`.\n\n");
        return section;
    }

    section.push_str("| Name | Date | Websites | Orders | CR | AC | Amount |\n");
    section.push_str("|:---|:---:|---:|---:|---:|---:|---:|\n");
    section.push_str(&format!(
        "| **Total** | | **{}** | **{}** | **{}** | **{}** | **{}** |\n",
        summary.total_websites,
        summary.total_orders,
        format_percent(summary.avg_cr, decimals),
        format_percent(summary.avg_ac, decimals),
        format_amount(summary.total_amount),
    ));

    for row in rows {
        let record = &row.record;
        let class = row.classification;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} {} | {} {} | {} {} |\n",
            escape_cell(&record.name),
            record.date,
            record.websites,
            record.orders,
            mark(class.cr_met),
            format_percent(row.metrics.cr, decimals),
            mark(class.ac_met),
            format_percent(row.metrics.ac_ratio, decimals),
            mark(class.amount_met),
            format_amount(record.tbt_amount),
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by perftrack*\n".to_string()
}

/// Generate a plain table for the terminal.
pub fn generate_table_report(view: &DashboardView, options: &ReportConfig) -> String {
    let decimals = options.decimals;
    let mut output = String::new();

    if view.rows.is_empty() {
        output.push_str("No records to show. Add entries with `perftrack add`.\n");
        return output;
    }

    let name_width = view
        .rows
        .iter()
        .map(|r| r.record.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Total".len());

    output.push_str(&format!(
        "{:<nw$}  {:<10}  {:>9}  {:>7}  {:>9}  {:>9}  {:>14}\n",
        "Name",
        "Date",
        "Websites",
        "Orders",
        "CR",
        "AC",
        "Amount",
        nw = name_width
    ));

    let summary = &view.summary;
    output.push_str(&format!(
        "{:<nw$}  {:<10}  {:>9}  {:>7}  {:>9}  {:>9}  {:>14}\n",
        "Total",
        "",
        summary.total_websites,
        summary.total_orders,
        format_percent(summary.avg_cr, decimals),
        format_percent(summary.avg_ac, decimals),
        format_amount(summary.total_amount),
        nw = name_width
    ));

    for row in &view.rows {
        let record = &row.record;
        let class = row.classification;
        output.push_str(&format!(
            "{:<nw$}  {:<10}  {:>9}  {:>7}  {:>9}  {:>9}  {:>14}\n",
            record.name,
            record.date.to_string(),
            record.websites,
            record.orders,
            flagged(format_percent(row.metrics.cr, decimals), class.cr_met),
            flagged(format_percent(row.metrics.ac_ratio, decimals), class.ac_met),
            flagged(format_amount(record.tbt_amount), class.amount_met),
            nw = name_width
        ));
    }

    let all_met = view
        .rows
        .iter()
        .filter(|r| r.classification.all_met())
        .count();
    output.push_str(&format!(
        "\n{} people | avg amount {} | CR met {} / missed {} | all standards met {}\n",
        summary.total_users,
        format_amount(summary.avg_amount),
        view.cr_attainment.met,
        view.cr_attainment.missed,
        all_met
    ));
    output.push('\n');
    output.push_str(&render_bars(&view.bar_chart, options.bar_width));

    output
}

/// Generate a JSON report.
pub fn generate_json_report(view: &DashboardView) -> Result<String> {
    serde_json::to_string_pretty(view).map_err(Into::into)
}

/// Render the preview shown after an entry is saved.
pub fn generate_entry_preview(
    entry: &Entry,
    preview: &EntryPreview,
    options: &ReportConfig,
) -> String {
    let decimals = options.decimals;
    let mut output = String::new();

    output.push_str(&format!("{} on {}\n", entry.name, entry.date));
    output.push_str(&format!(
        "   CR: {} (unconverted {})\n",
        format_percent(preview.converted, decimals),
        format_percent(preview.unconverted, decimals)
    ));
    output.push_str(&format!(
        "   AC ratio: {}\n",
        format_percent(preview.metrics.ac_ratio, decimals)
    ));
    output.push_str(&format!("   Amount: {}\n\n", format_amount(entry.tbt_amount)));
    output.push_str(&render_bars(&preview.bars, options.bar_width));

    output
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

/// Render chart points as horizontal text bars scaled to `width`.
fn render_bars(points: &[ChartPoint], width: usize) -> String {
    let label_width = points
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);

    let mut output = String::new();
    for point in points {
        output.push_str(&format!(
            "{:<lw$} | {} {}\n",
            point.label,
            text_bar(point.value, max, width),
            point.value,
            lw = label_width
        ));
    }

    output
}

fn text_bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * width as f64).round() as usize;
    "█".repeat(len.max(1))
}

fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Format an amount with thousands separators and two decimals.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

fn mark(met: bool) -> &'static str {
    if met {
        "✅"
    } else {
        "❌"
    }
}

/// Append a `!` to values that miss their standard.
fn flagged(value: String, met: bool) -> String {
    if met {
        value
    } else {
        format!("{}!", value)
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{build_view, entry_preview};
    use crate::models::{RecordFilter, SortConfig, SortKey, Standards, ViewQuery};
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_test_view() -> DashboardView {
        let entries = vec![
            Entry {
                websites: 100,
                orders: 20,
                main_products: 10,
                ac_count: 6,
                tbt_amount: 1500.0,
                ..Entry::new("Ana", day("2024-01-01"))
            },
            Entry {
                websites: 50,
                orders: 25,
                main_products: 4,
                ac_count: 1,
                tbt_amount: 250.5,
                ..Entry::new("Bo|b", day("2024-01-01"))
            },
        ];
        let query = ViewQuery {
            filter: RecordFilter {
                name: None,
                date: Some(day("2024-01-01")),
            },
            sort: Some(SortConfig::ascending(SortKey::Cr)),
        };
        build_view(&entries, &query, &Standards::default())
    }

    #[test]
    fn test_generate_markdown_report() {
        let view = create_test_view();
        let markdown = generate_markdown_report(&view, &ReportConfig::default());

        assert!(markdown.contains("# Performance Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Date:** 2024-01-01"));
        assert!(markdown.contains("- **Sorted by:** cr ↑"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Records"));
        assert!(markdown.contains("Bo\\|b"));
        assert!(markdown.contains("❌ 20.0%"));
        assert!(markdown.contains("✅ 50.0%"));
        assert!(markdown.contains("| 1 | 1 |"));
    }

    #[test]
    fn test_markdown_without_records() {
        let view = build_view(&[], &ViewQuery::default(), &Standards::default());
        let markdown = generate_markdown_report(&view, &ReportConfig::default());
        assert!(markdown.contains("No records to show"));
        assert!(markdown.contains("- **Filter:** none"));
        assert!(markdown.contains("| 0 | 0 | 0 | 0 | 0 | 0.0% | 0.0% | 0.00 | 0.00 |"));
    }

    #[test]
    fn test_generate_table_report() {
        let view = create_test_view();
        let table = generate_table_report(&view, &ReportConfig::default());

        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("Name"));
        assert!(lines[1].starts_with("Total"));
        // sorted by CR ascending: Ana (20%) before Bo|b (50%)
        assert!(lines[2].starts_with("Ana"));
        assert!(lines[2].contains("20.0%!"));
        assert!(lines[3].starts_with("Bo|b"));
        assert!(table.contains("CR met 1 / missed 1"));
        assert!(table.contains("all standards met 0"));
    }

    #[test]
    fn test_generate_json_report() {
        let view = create_test_view();
        let json = generate_json_report(&view).unwrap();

        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"totalWebsites\": 150"));
        assert!(json.contains("\"crMet\""));
        assert!(json.contains("\"barChart\""));
    }

    #[test]
    fn test_render_report_dispatch() {
        let view = create_test_view();
        let options = ReportConfig {
            format: ReportFormat::Json,
            ..ReportConfig::default()
        };
        assert!(render_report(&view, &options).unwrap().starts_with('{'));
    }

    #[test]
    fn test_entry_preview_output() {
        let entry = Entry {
            websites: 80,
            orders: 20,
            tbt_amount: 1234567.891,
            ..Entry::new("Ana", day("2024-01-01"))
        };
        let text = generate_entry_preview(&entry, &entry_preview(&entry), &ReportConfig::default());
        assert!(text.contains("CR: 25.0% (unconverted 75.0%)"));
        assert!(text.contains("AC ratio: 0.0%"));
        assert!(text.contains("Amount: 1,234,567.89"));
        assert!(text.contains("Websites"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(123456.0), "123,456.00");
    }

    #[test]
    fn test_text_bar_scaling() {
        assert_eq!(text_bar(0.0, 10.0, 20), "");
        assert_eq!(text_bar(10.0, 10.0, 20).chars().count(), 20);
        assert_eq!(text_bar(5.0, 10.0, 20).chars().count(), 10);
        assert_eq!(text_bar(0.1, 1000.0, 20).chars().count(), 1);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.md");
        write_report("# hi\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hi\n");
    }
}
