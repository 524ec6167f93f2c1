//! Durable record of processed file names, the idempotency source of truth.
//!
//! The store is a line-oriented text file: a fixed header line followed by one
//! processed file name per line, append-only for the life of the deployment.
//! Appends take an exclusive advisory lock and fsync before the entry counts
//! as recorded, so a crash between artifact write and ledger append can only
//! cause a harmless reprocess, never a silent skip.

use anyhow::{bail, Context, Result};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Header line of the ledger file.
pub const LEDGER_HEADER: &str = "Processed Files";

/// In-memory view of the processed-files ledger, backed by an append-only file.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    names: HashSet<String>,
}

impl Ledger {
    /// Open the ledger, creating an empty store with a header if absent.
    ///
    /// A store that exists but cannot be parsed is an error with no recovery
    /// path: trusting a corrupt ledger risks silent duplicate processing, so
    /// callers treat this as fatal.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Self::create(path)
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open ledger: {}", path.display()))?;
        let mut lines = BufReader::new(file).lines();

        let header = match lines.next() {
            Some(line) => line
                .with_context(|| format!("Ledger is not valid UTF-8: {}", path.display()))?,
            None => bail!(
                "Ledger {} is empty; expected '{LEDGER_HEADER}' header",
                path.display()
            ),
        };
        if header.trim() != LEDGER_HEADER {
            bail!(
                "Ledger {} has unrecognized header {:?}; expected '{LEDGER_HEADER}'",
                path.display(),
                header
            );
        }

        let mut names = HashSet::new();
        for line in lines {
            let line = line
                .with_context(|| format!("Ledger is not valid UTF-8: {}", path.display()))?;
            let name = line.trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            names,
        })
    }

    fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create ledger directory: {}", parent.display())
                })?;
            }
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create ledger: {}", path.display()))?;
        writeln!(file, "{LEDGER_HEADER}")
            .with_context(|| format!("Failed to write ledger header: {}", path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync ledger: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            names: HashSet::new(),
        })
    }

    /// Whether `name` has already been processed. O(1).
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of recorded names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Durably append `name`, then add it to the in-memory set.
    ///
    /// Must be called only after the corresponding artifact has been fully
    /// written. Recording an already-known name is a no-op so the file never
    /// accumulates duplicates.
    pub fn record(&mut self, name: &str) -> Result<()> {
        if self.names.contains(name) {
            return Ok(());
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open ledger for append: {}", self.path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock ledger: {}", self.path.display()))?;

        let mut writer = &file;
        writeln!(writer, "{name}")
            .with_context(|| format!("Failed to append to ledger: {}", self.path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync ledger: {}", self.path.display()))?;

        self.names.insert(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_writes_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");

        let ledger = Ledger::load_or_create(&path).unwrap();
        assert!(ledger.is_empty());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{LEDGER_HEADER}\n"));
    }

    #[test]
    fn test_record_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");

        let mut ledger = Ledger::load_or_create(&path).unwrap();
        ledger.record("F001.csv").unwrap();
        ledger.record("NZL_2024.csv").unwrap();
        assert!(ledger.contains("F001.csv"));
        assert!(!ledger.contains("F002.csv"));

        // Entries survive a restart.
        let reloaded = Ledger::load_or_create(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("F001.csv"));
        assert!(reloaded.contains("NZL_2024.csv"));
    }

    #[test]
    fn test_record_is_append_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");

        let mut ledger = Ledger::load_or_create(&path).unwrap();
        ledger.record("F001.csv").unwrap();
        ledger.record("F001.csv").unwrap();
        assert_eq!(ledger.len(), 1);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("F001.csv").count(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");

        let mut ledger = Ledger::load_or_create(&path).unwrap();
        ledger.record("F001.csv").unwrap();
        assert!(!ledger.contains("f001.csv"));
    }

    #[test]
    fn test_unrecognized_header_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");
        fs::write(&path, "Something Else\nF001.csv\n").unwrap();

        let err = Ledger::load_or_create(&path).unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.txt");
        fs::write(&path, "").unwrap();

        assert!(Ledger::load_or_create(&path).is_err());
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("processed.txt");

        let ledger = Ledger::load_or_create(&path).unwrap();
        assert!(ledger.is_empty());
        assert!(path.exists());
    }
}
