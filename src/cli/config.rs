//! TOML configuration file support.
//!
//! ```toml
//! # imsframe.toml
//! [import]
//! instrument = "tims"
//! exclude_waters_lockmass = true
//! progress_interval = 100
//! storage = "spill"
//!
//! [import.scan_filter]
//! ms_levels = [1, 2]
//! retention_time = [0.0, 600.0]
//! ```

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;

use imsframe::builder::{ImportConfig, ScanFilter};
use imsframe::ingest::MobilityType;

/// Root configuration structure for imsframe.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Import-specific settings.
    #[serde(default)]
    pub import: ImportSection,
}

/// Backing store for scan payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Keep payloads in memory
    #[default]
    Memory,
    /// Spill payloads to an anonymous temporary file
    Spill,
}

/// Configuration for the import command.
#[derive(Debug, Default, Deserialize)]
pub struct ImportSection {
    /// Mobility technique of the instrument.
    pub instrument: Option<MobilityType>,

    /// Drop Waters lock-mass functions.
    pub exclude_waters_lockmass: Option<bool>,

    /// Frames between progress log lines.
    pub progress_interval: Option<usize>,

    /// Payload store.
    pub storage: Option<StorageKind>,

    /// Scan selection.
    #[serde(default)]
    pub scan_filter: ScanFilter,
}

impl ImportSection {
    /// Library configuration with file values over defaults.
    pub fn import_config(&self) -> ImportConfig {
        let defaults = ImportConfig::default();
        ImportConfig {
            scan_filter: self.scan_filter.clone(),
            exclude_waters_lockmass: self
                .exclude_waters_lockmass
                .unwrap_or(defaults.exclude_waters_lockmass),
            progress_interval: self.progress_interval.unwrap_or(defaults.progress_interval),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
