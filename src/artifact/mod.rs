//! Artifact builder: converts one source file into one finalized document.
//!
//! Pipeline per file: parse CSV, write an intermediate document, apply the
//! best-effort protection step, apply the category layout, persist the final
//! artifact. Nothing survives in the destination on a non-best-effort failure
//! except a stale intermediate after a hard crash, which the next successful
//! build overwrites.

pub mod layout;
pub mod protect;
pub mod table;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::classify::Category;
use layout::layout_for;
use table::Table;

/// Extension of the finalized artifact.
pub const ARTIFACT_EXTENSION: &str = "tsv";

/// Extension of the intermediate document written before layout.
const INTERMEDIATE_EXTENSION: &str = "partial";

#[derive(Debug, Error)]
pub enum BuildError {
    /// Source content could not be parsed; the file is retried next tick.
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The category layout rejected the document.
    #[error("layout failed for {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("I/O error for {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build the finalized artifact for one source file.
///
/// Returns the path of the final document. The file name is the source name
/// with the extension replaced by [`ARTIFACT_EXTENSION`].
pub fn build(category: Category, source: &Path, dest_dir: &Path) -> Result<PathBuf, BuildError> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| BuildError::Io {
            path: source.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "source has no usable file stem",
            ),
        })?;

    let layout = layout_for(category).ok_or_else(|| BuildError::Format {
        path: source.to_path_buf(),
        reason: format!("no layout for {} category", category.label()),
    })?;

    let mut table = Table::from_csv_path(source)?;

    fs::create_dir_all(dest_dir).map_err(|source| BuildError::Io {
        path: dest_dir.to_path_buf(),
        source,
    })?;

    let intermediate = dest_dir.join(format!("{stem}.{INTERMEDIATE_EXTENSION}"));
    table.write_tsv(&intermediate)?;

    // Best-effort: a failed protection step is logged, never fatal.
    if let Err(e) = protect::protect(&intermediate) {
        warn!(document = %intermediate.display(), "protection step failed: {e:#}");
    }

    if let Err(e) = layout.apply(&mut table) {
        let _ = table::remove_existing(&intermediate);
        return Err(BuildError::Format {
            path: source.to_path_buf(),
            reason: e.to_string(),
        });
    }

    let final_path = dest_dir.join(format!("{stem}.{ARTIFACT_EXTENSION}"));
    table.write_tsv(&final_path)?;

    // The final document carries whatever protection the intermediate got.
    if let Ok(metadata) = fs::metadata(&intermediate) {
        let _ = fs::set_permissions(&final_path, metadata.permissions());
    }
    let _ = table::remove_existing(&intermediate);

    Ok(final_path)
}
