//! Watch command - supervises a `run` child with a live status console.
//!
//! The console repaints once per second: supervision state, child pid,
//! restart count, and the rolling window of recent child output. The child
//! owns the durable log; the watchdog logs to the console only, and the
//! displayed output window is never persisted.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::logging;
use crate::watchdog::{SupervisorState, Watchdog};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn execute(config_path: &Path, verbose: bool) -> Result<()> {
    // Load eagerly so a broken config fails here, not inside the child.
    let config = Config::load(config_path)?;
    logging::init_console(verbose)?;

    let exe = std::env::current_exe().context("Failed to locate own executable")?;
    let mut args = vec![
        "run".to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
    ];
    if verbose {
        args.push("--verbose".to_string());
    }

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install shutdown handler")?;

    let mut watchdog = Watchdog::new(exe, args);
    watchdog.start()?;

    while !stop.load(Ordering::SeqCst) {
        let state = watchdog.poll();
        repaint(&config, state, &watchdog);
        thread::sleep(POLL_INTERVAL);
    }

    println!("\n{} Stopping supervised scheduler...", "→".cyan().bold());
    watchdog.stop();
    println!("{} Watchdog stopped", "✓".green().bold());
    Ok(())
}

fn repaint(config: &Config, state: SupervisorState, watchdog: &Watchdog) {
    // Clear screen and home the cursor.
    print!("\x1b[2J\x1b[H");

    let state_label = match state {
        SupervisorState::Running => state.label().green().bold(),
        SupervisorState::Crashed => state.label().red().bold(),
        SupervisorState::NotRunning => state.label().yellow().bold(),
    };
    let pid = match watchdog.child_pid() {
        Some(pid) if watchdog.child_alive() => pid.to_string(),
        Some(pid) => format!("{pid} (not responding)"),
        None => "-".to_string(),
    };
    println!("{} conveyor watchdog", "●".cyan().bold());
    println!(
        "  scheduler: {state_label}   pid: {pid}   restarts: {}   interval: {}m",
        watchdog.restarts(),
        config.interval_minutes
    );
    println!("{}", "─".repeat(72).dimmed());

    for line in watchdog.output() {
        println!("{line}");
    }
}
