//! One-way, newer-wins directory replication.
//!
//! Walks the source tree, preserves relative structure under the destination,
//! and copies a file only when the destination copy is missing or strictly
//! older. Source modification times are carried over to the copies so the
//! comparison stays stable across repeated syncs.

use anyhow::{Context, Result};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Accounting for one mirror pass over a source/destination pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MirrorReport {
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Sync one pair. A missing source directory is a warning, not an error;
/// individual copy failures are logged and counted, and the pass continues.
pub fn sync_pair(source: &Path, dest: &Path) -> MirrorReport {
    let mut report = MirrorReport::default();

    if !source.is_dir() {
        warn!(source = %source.display(), "mirror source missing, skipping pair");
        return report;
    }

    for entry in WalkDir::new(source) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("mirror walk error under {}: {e}", source.display());
                report.failed += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(source) {
            Ok(rel) => rel,
            Err(_) => {
                // walkdir only yields paths under its root
                report.failed += 1;
                continue;
            }
        };
        let target = dest.join(relative);

        match copy_if_newer(entry.path(), &target) {
            Ok(true) => {
                debug!(file = %relative.display(), "mirrored");
                report.copied += 1;
            }
            Ok(false) => report.skipped += 1,
            Err(e) => {
                warn!(file = %relative.display(), "mirror copy failed: {e:#}");
                report.failed += 1;
            }
        }
    }

    report
}

/// Copy `src` to `dst` when `dst` is missing or strictly older. Returns
/// whether a copy happened.
fn copy_if_newer(src: &Path, dst: &Path) -> Result<bool> {
    let src_meta = fs::metadata(src)
        .with_context(|| format!("Failed to stat source: {}", src.display()))?;
    let src_mtime = FileTime::from_last_modification_time(&src_meta);

    if let Ok(dst_meta) = fs::metadata(dst) {
        let dst_mtime = FileTime::from_last_modification_time(&dst_meta);
        if dst_mtime >= src_mtime {
            return Ok(false);
        }
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::copy(src, dst)
        .with_context(|| format!("Failed to copy to: {}", dst.display()))?;
    filetime::set_file_mtime(dst, src_mtime)
        .with_context(|| format!("Failed to set mtime on: {}", dst.display()))?;

    Ok(true)
}
