//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.perftrack.toml` files.

use crate::ledger::ReplacePolicy;
use crate::models::Standards;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".perftrack.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Performance standards.
    #[serde(default)]
    pub standards: Standards,

    /// Store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path of the entry data file.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("perftrack_data.json")
}

/// Entry store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which prior entries a new submission replaces.
    #[serde(default)]
    pub replace_policy: ReplacePolicy,

    /// Code that must be given to delete all data.
    #[serde(default = "default_clear_code")]
    pub clear_code: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            replace_policy: ReplacePolicy::default(),
            clear_code: default_clear_code(),
        }
    }
}

fn default_clear_code() -> String {
    "923".to_string()
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Decimal places shown for percentages.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Width of the longest text chart bar, in characters.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            decimals: default_decimals(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_decimals() -> usize {
    1
}

fn default_bar_width() -> usize {
    30
}

/// Output format of the dashboard report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plain terminal table (default)
    #[default]
    Table,
    /// Markdown document
    Markdown,
    /// JSON document
    Json,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values given explicitly on the command line override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.general.data_file = data.clone();
        }

        if let crate::cli::Command::Show(ref show) = args.command {
            if let Some(cr) = show.cr {
                self.standards.cr = cr;
            }
            if let Some(ac) = show.ac {
                self.standards.ac = ac;
            }
            if let Some(tbt) = show.tbt {
                self.standards.tbt = tbt;
            }
            if let Some(format) = show.format {
                self.report.format = format;
            }
        }

        if let crate::cli::Command::Add(ref add) = args.command {
            if let Some(policy) = add.replace {
                self.store.replace_policy = policy.into();
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.data_file, PathBuf::from("perftrack_data.json"));
        assert_eq!(config.standards.cr, 30.0);
        assert_eq!(config.store.clear_code, "923");
        assert_eq!(config.store.replace_policy, ReplacePolicy::NameAndDate);
        assert_eq!(config.report.format, ReportFormat::Table);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_file = "team/data.json"

[standards]
cr = 25.5
tbt = 2000

[store]
replace_policy = "name"
clear_code = "secret"

[report]
format = "markdown"
decimals = 2
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_file, PathBuf::from("team/data.json"));
        assert_eq!(config.standards.cr, 25.5);
        assert_eq!(config.standards.ac, 50.0);
        assert_eq!(config.standards.tbt, 2000.0);
        assert_eq!(config.store.replace_policy, ReplacePolicy::Name);
        assert_eq!(config.store.clear_code, "secret");
        assert_eq!(config.report.format, ReportFormat::Markdown);
        assert_eq!(config.report.decimals, 2);
        assert_eq!(config.report.bar_width, 30);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[standards]"));
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.store.clear_code, "923");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[report]\nformat = \"json\"\n")
            .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.report.format, ReportFormat::Json);
    }

    #[test]
    fn test_load_invalid_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[standards]\ncr = \"high\"\n")
            .unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}
