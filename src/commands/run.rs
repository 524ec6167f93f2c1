//! Run command - the scheduler loop in the foreground.
//!
//! This is the process the watchdog supervises. SIGINT and SIGTERM set the
//! stop flag; the loop then stops at the next step boundary, within one
//! second during a sleep phase.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::ledger::Ledger;
use crate::logging;
use crate::scheduler::Scheduler;

pub fn execute(config_path: &Path, verbose: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    logging::init(&config.log_folder, verbose)?;
    let mut ledger =
        Ledger::load_or_create(&config.record_process).context("Failed to open ledger")?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    // The termination feature routes SIGTERM here as well as Ctrl-C. A reload
    // signal is reserved but intentionally not wired up.
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install shutdown handler")?;

    println!(
        "{} Scheduler running every {} minute(s); Ctrl-C to stop",
        "→".cyan().bold(),
        config.interval_minutes
    );

    let mut scheduler = Scheduler::new(config, stop);
    scheduler.run(&mut ledger)?;

    println!("{} Scheduler stopped", "✓".green().bold());
    Ok(())
}
