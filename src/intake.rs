//! One intake pass over the drop folder.
//!
//! A tick lists the drop folder's immediate entries, classifies each name,
//! filters against the ledger, and builds artifacts for the remainder. One
//! file's failure never aborts the tick; failures are logged and the file is
//! retried on every subsequent tick until it is fixed or removed.

use anyhow::{Context, Result};
use std::fs;
use tracing::{debug, info, warn};

use crate::artifact;
use crate::classify::{classify, Category};
use crate::config::Config;
use crate::ledger::Ledger;

/// Accounting for one intake tick. `processed + skipped + failed` equals the
/// number of entries listed in the drop folder.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TickReport {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

/// Run one intake tick.
///
/// Entries are visited in directory-listing order, which is not stable across
/// platforms; only eventual completeness is guaranteed. Running a tick twice
/// with no new files processes nothing the second time.
pub fn run_tick(config: &Config, ledger: &mut Ledger) -> Result<TickReport> {
    let mut report = TickReport::default();
    let rules = config.naming_rules();

    let entries = fs::read_dir(&config.raw_file_source).with_context(|| {
        format!(
            "Failed to list drop folder: {}",
            config.raw_file_source.display()
        )
    })?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("unreadable drop folder entry: {e}");
                report.failed += 1;
                continue;
            }
        };

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            warn!(entry = %entry.path().display(), "skipping non-UTF-8 file name");
            report.skipped += 1;
            continue;
        };

        if entry.path().is_dir() {
            report.skipped += 1;
            continue;
        }

        let category = classify(name, &rules);
        let dest = match category {
            Category::Primary => &config.primary_process_dest,
            Category::Secondary => &config.secondary_process_dest,
            Category::Ignore => {
                debug!(%name, "no category match, skipping");
                report.skipped += 1;
                continue;
            }
        };

        if ledger.contains(name) {
            debug!(%name, "already processed, skipping");
            report.skipped += 1;
            continue;
        }

        match artifact::build(category, &entry.path(), dest) {
            Ok(output) => match ledger.record(name) {
                Ok(()) => {
                    info!(%name, category = category.label(), output = %output.display(), "processed");
                    report.processed += 1;
                }
                Err(e) => {
                    // Artifact exists but the ledger append failed; the file
                    // will be rebuilt next tick, which only overwrites it.
                    warn!(%name, "artifact written but ledger append failed: {e:#}");
                    report.failed += 1;
                }
            },
            Err(e) => {
                warn!(%name, "processing failed, will retry next tick: {e:#}");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
