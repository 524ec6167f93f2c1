//! Process-wide configuration, loaded once at startup from a JSON file.
//!
//! Every component receives the config by reference; nothing mutates it after
//! load. A missing or malformed file is fatal at every entry point.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::NamingRules;

fn default_primary_prefix() -> String {
    "F".to_string()
}

fn default_secondary_marker() -> String {
    "NZL".to_string()
}

/// Pipeline configuration.
///
/// Paths are taken as-is from the config file; relative paths resolve against
/// the working directory of the process.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Drop folder watched for incoming CSV exports (flat, non-recursive).
    pub raw_file_source: PathBuf,

    /// Destination directory for primary-category artifacts.
    pub primary_process_dest: PathBuf,

    /// Destination directory for secondary-category artifacts.
    pub secondary_process_dest: PathBuf,

    /// Mirror pair for primary reference data.
    pub primary_copy_source: PathBuf,
    pub primary_copy_dest: PathBuf,

    /// Mirror pair for secondary reference data.
    pub secondary_copy_source: PathBuf,
    pub secondary_copy_dest: PathBuf,

    /// Minutes to sleep between scheduler cycles.
    pub interval_minutes: u64,

    /// Path of the processed-files ledger.
    pub record_process: PathBuf,

    /// Directory receiving the rotated log files.
    pub log_folder: PathBuf,

    /// File-name prefix selecting the primary category.
    #[serde(default = "default_primary_prefix")]
    pub primary_prefix: String,

    /// File-name substring selecting the secondary category.
    #[serde(default = "default_secondary_marker")]
    pub secondary_marker: String,
}

impl Config {
    /// Load and validate the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.interval_minutes == 0 {
            bail!("interval_minutes must be at least 1");
        }
        if self.primary_prefix.is_empty() {
            bail!("primary_prefix must not be empty");
        }
        if self.secondary_marker.is_empty() {
            bail!("secondary_marker must not be empty");
        }
        Ok(())
    }

    /// Classifier patterns derived from this config.
    pub fn naming_rules(&self) -> NamingRules {
        NamingRules {
            primary_prefix: self.primary_prefix.clone(),
            secondary_marker: self.secondary_marker.clone(),
        }
    }

    /// The mirror pairs synced each cycle, with a label for logging.
    pub fn mirror_pairs(&self) -> [(&'static str, &Path, &Path); 2] {
        [
            (
                "primary",
                self.primary_copy_source.as_path(),
                self.primary_copy_dest.as_path(),
            ),
            (
                "secondary",
                self.secondary_copy_source.as_path(),
                self.secondary_copy_dest.as_path(),
            ),
        ]
    }
}
