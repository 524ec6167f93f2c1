//! In-memory tabular document parsed from a CSV export.

use std::fs;
use std::io;
use std::path::Path;

use super::BuildError;

/// Parsed tabular content: one header row plus data rows.
///
/// The csv reader enforces equal row arity, so every row has exactly
/// `headers.len()` cells once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse a CSV file. A missing header row or structurally malformed
    /// content is a parse error; the source is left untouched.
    pub fn from_csv_path(path: &Path) -> Result<Self, BuildError> {
        let mut reader = csv::Reader::from_path(path).map_err(|source| BuildError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| BuildError::Parse {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(BuildError::Parse {
                path: path.to_path_buf(),
                source: csv::Error::from(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "missing header row",
                )),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| BuildError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Write the table as a tab-separated document, replacing any existing
    /// file at `path` (including a read-only survivor from an earlier run).
    pub fn write_tsv(&self, path: &Path) -> Result<(), BuildError> {
        remove_existing(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let io_err = |source: csv::Error| BuildError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, source),
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(io_err)?;

        writer.write_record(&self.headers).map_err(io_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(io_err)?;
        }
        writer.flush().map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

/// Remove `path` if present, clearing read-only bits when they block removal.
pub(super) fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(_) => {
            if let Ok(metadata) = fs::metadata(path) {
                let mut perms = metadata.permissions();
                #[allow(clippy::permissions_set_readonly_false)]
                perms.set_readonly(false);
                let _ = fs::set_permissions(path, perms);
            }
            fs::remove_file(path)
        }
    }
}
