//! Tick command - one intake pass plus one mirror pass, then exit.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::intake;
use crate::ledger::Ledger;
use crate::logging;
use crate::mirror;

/// Execute a single pipeline cycle in the foreground.
///
/// Per-file failures are absorbed into the report; only startup problems
/// (config, ledger, logging) exit non-zero.
pub fn execute(config_path: &Path, verbose: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    logging::init(&config.log_folder, verbose)?;
    let mut ledger =
        Ledger::load_or_create(&config.record_process).context("Failed to open ledger")?;

    println!(
        "{} Running one intake pass over {}",
        "→".cyan().bold(),
        config.raw_file_source.display()
    );

    let report = intake::run_tick(&config, &mut ledger)?;
    println!(
        "{} Intake: {} processed, {} skipped, {} failed",
        if report.failed == 0 {
            "✓".green().bold()
        } else {
            "!".yellow().bold()
        },
        report.processed,
        report.skipped,
        report.failed
    );

    for (label, source, dest) in config.mirror_pairs() {
        let sync = mirror::sync_pair(source, dest);
        println!(
            "{} Mirror {label}: {} copied, {} skipped, {} failed",
            if sync.failed == 0 {
                "✓".green().bold()
            } else {
                "!".yellow().bold()
            },
            sync.copied,
            sync.skipped,
            sync.failed
        );
    }

    Ok(())
}
