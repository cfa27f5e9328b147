//! perftrack - per-person performance tracking
//!
//! A CLI tool that records daily performance entries per person in a
//! local JSON file and renders merged, filtered and sorted summaries
//! measured against configurable standards.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime or validation error (unreadable config, wrong
//!       confirmation code, missing name, etc.)

mod analysis;
mod cli;
mod config;
mod ledger;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{AddArgs, Args, Command, NamesArgs, ShowArgs};
use config::{Config, DEFAULT_CONFIG_FILE};
use ledger::Notice;
use std::path::Path;
use store::{EntryStore, JsonFileStore};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    debug!("perftrack v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .perftrack.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize standards, the data file and the report format.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `PERFTRACK_LOG` takes precedence over the verbosity flags when set.
/// Logs go to stderr so reports on stdout stay clean.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_env("PERFTRACK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration and dispatch the command.
fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let mut store = JsonFileStore::new(&config.general.data_file);
    info!("Using data file: {}", store.path().display());

    match args.command {
        Command::Add(ref add) => handle_add(add, &mut store, &config),
        Command::Show(ref show) => handle_show(show, &store, &config),
        Command::Delete(ref delete) => {
            ledger::delete_from_store(&mut store, &delete.name, delete.date)?;
            println!("✅ Deleted entries for {} on {}", delete.name, delete.date);
            Ok(())
        }
        Command::Clear(ref clear) => {
            ledger::clear_all(&mut store, &clear.code, &config.store.clear_code)?;
            println!("✅ All data deleted.");
            Ok(())
        }
        Command::Names(ref names) => handle_names(names, &store),
        Command::InitConfig => handle_init_config(),
    }
}

/// Submit a new entry and print its preview.
fn handle_add(add: &AddArgs, store: &mut dyn EntryStore, config: &Config) -> Result<()> {
    let loaded = ledger::load_entries(&*store);
    if let Some(Notice::ReadFailed(reason)) = loaded.notice {
        anyhow::bail!("refusing to overwrite unreadable data: {}", reason);
    }

    let entry = add.to_entry(Local::now().date_naive());
    let updated = ledger::submit(&loaded.entries, entry, config.store.replace_policy)?;
    store.save(&updated).context("Failed to save entries")?;

    // submit appends the new entry last
    if let Some(saved) = updated.last() {
        println!("✅ Saved entry.\n");
        let preview = analysis::entry_preview(saved);
        print!(
            "{}",
            report::generate_entry_preview(saved, &preview, &config.report)
        );
    }

    Ok(())
}

/// Build the dashboard view and print or write it.
fn handle_show(show: &ShowArgs, store: &dyn EntryStore, config: &Config) -> Result<()> {
    let loaded = ledger::load_entries(store);
    print_notice(loaded.notice.as_ref());

    let query = show.to_query();
    let view = analysis::build_view(&loaded.entries, &query, &config.standards);
    debug!(
        "View has {} rows out of {} entries",
        view.rows.len(),
        loaded.entries.len()
    );

    let content = report::render_report(&view, &config.report)?;

    match show.output {
        Some(ref path) => {
            report::write_report(&content, path)?;
            println!("✅ Report saved to: {}", path.display());
        }
        None => print!("{}", content),
    }

    Ok(())
}

/// Print the known names matching the query.
fn handle_names(names: &NamesArgs, store: &dyn EntryStore) -> Result<()> {
    let loaded = ledger::load_entries(store);
    print_notice(loaded.notice.as_ref());

    let query = names.query.as_deref().unwrap_or("");
    for name in analysis::name_suggestions(&loaded.entries, query) {
        println!("{}", name);
    }

    Ok(())
}

fn print_notice(notice: Option<&Notice>) {
    match notice {
        Some(notice) if notice.is_error() => eprintln!("❌ {}", notice),
        Some(notice) => eprintln!("ℹ️  {}", notice),
        None => {}
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
