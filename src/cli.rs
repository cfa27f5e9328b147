//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ReportFormat;
use crate::ledger::ReplacePolicy;
use crate::models::{Entry, RecordFilter, SortConfig, SortDirection, SortKey, ViewQuery};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// perftrack - per-person performance tracking
///
/// Record daily website visits, orders, main product and AC counts and
/// amounts per person, then review merged, filtered and sorted summaries
/// measured against configurable standards.
///
/// Examples:
///   perftrack add --name Ana --websites 120 --orders 30 --amount 1500
///   perftrack show --date 2024-01-01 --sort cr --desc
///   perftrack show --name an --format markdown --output report.md
///   perftrack delete --name Ana --date 2024-01-01
///   perftrack init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path of the entry data file
    ///
    /// Defaults to the value in .perftrack.toml, or perftrack_data.json.
    #[arg(short, long, global = true, value_name = "FILE", env = "PERFTRACK_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .perftrack.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE", env = "PERFTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Record an entry for a person
    Add(AddArgs),
    /// Show the merged, filtered and sorted dashboard
    Show(ShowArgs),
    /// Delete all entries of one person on one date
    Delete(DeleteArgs),
    /// Delete all stored data
    Clear(ClearArgs),
    /// List known names, optionally narrowed by a query
    Names(NamesArgs),
    /// Generate a default .perftrack.toml configuration file
    InitConfig,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AddArgs {
    /// Person the entry belongs to
    #[arg(short, long)]
    pub name: String,

    /// Date of the entry (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Website visits
    #[arg(long, default_value = "0")]
    pub websites: u64,

    /// Orders placed
    #[arg(long, default_value = "0")]
    pub orders: u64,

    /// Main products sold
    #[arg(long, default_value = "0")]
    pub main_products: u64,

    /// AC units sold
    #[arg(long, default_value = "0")]
    pub ac_count: u64,

    /// Monetary amount
    #[arg(long, default_value = "0")]
    pub amount: f64,

    /// Which prior entries this submission replaces
    ///
    /// Overrides the replace_policy config setting.
    #[arg(long, value_name = "MODE")]
    pub replace: Option<ReplaceMode>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Only records whose name contains this text (case-insensitive)
    #[arg(short, long, value_name = "TEXT")]
    pub name: Option<String>,

    /// Only records of this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Column to sort by
    #[arg(long, value_name = "KEY")]
    pub sort: Option<SortField>,

    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// CR standard in percent
    #[arg(long, value_name = "PERCENT")]
    pub cr: Option<f64>,

    /// AC ratio standard in percent
    #[arg(long, value_name = "PERCENT")]
    pub ac: Option<f64>,

    /// Amount standard
    #[arg(long, value_name = "AMOUNT")]
    pub tbt: Option<f64>,

    /// Output format (table, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DeleteArgs {
    /// Person whose entries are deleted
    #[arg(short, long)]
    pub name: String,

    /// Date of the entries (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClearArgs {
    /// Confirmation code
    #[arg(long)]
    pub code: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct NamesArgs {
    /// Text the names must contain (case-insensitive)
    pub query: Option<String>,
}

/// Sort column for `show --sort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortField {
    Name,
    Date,
    Websites,
    Orders,
    MainProducts,
    AcCount,
    TbtAmount,
    /// Conversion rate
    Cr,
    /// AC ratio
    Ac,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Name => SortKey::Name,
            SortField::Date => SortKey::Date,
            SortField::Websites => SortKey::Websites,
            SortField::Orders => SortKey::Orders,
            SortField::MainProducts => SortKey::MainProducts,
            SortField::AcCount => SortKey::AcCount,
            SortField::TbtAmount => SortKey::TbtAmount,
            SortField::Cr => SortKey::Cr,
            SortField::Ac => SortKey::Ac,
        }
    }
}

/// Replace mode for `add --replace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReplaceMode {
    /// Replace entries with the same name and date
    NameAndDate,
    /// Replace entries with the same name on any date
    Name,
}

impl From<ReplaceMode> for ReplacePolicy {
    fn from(mode: ReplaceMode) -> Self {
        match mode {
            ReplaceMode::NameAndDate => ReplacePolicy::NameAndDate,
            ReplaceMode::Name => ReplacePolicy::Name,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match self.command {
            Command::Add(ref add) => {
                if !add.amount.is_finite() || add.amount < 0.0 {
                    return Err("Amount must be a non-negative number".to_string());
                }
            }
            Command::Show(ref show) => {
                for (flag, value) in [("--cr", show.cr), ("--ac", show.ac), ("--tbt", show.tbt)] {
                    if let Some(v) = value {
                        if !v.is_finite() || v < 0.0 {
                            return Err(format!("{} must be a non-negative number", flag));
                        }
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl AddArgs {
    /// Build the entry to submit, dated `today` unless `--date` was given.
    pub fn to_entry(&self, today: NaiveDate) -> Entry {
        Entry {
            websites: self.websites,
            orders: self.orders,
            main_products: self.main_products,
            ac_count: self.ac_count,
            tbt_amount: self.amount,
            ..Entry::new(self.name.clone(), self.date.unwrap_or(today))
        }
    }
}

impl ShowArgs {
    /// Build the view query from the filter and sort flags.
    pub fn to_query(&self) -> ViewQuery {
        ViewQuery {
            filter: RecordFilter {
                name: self.name.clone(),
                date: self.date,
            },
            sort: self.sort.map(|field| SortConfig {
                key: field.into(),
                direction: if self.desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
            }),
        }
    }
}
