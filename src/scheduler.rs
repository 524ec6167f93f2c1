//! Continuous scheduler: intake tick, mirror ticks, interruptible sleep.
//!
//! States: `Idle → Running → (Sleeping ⇄ Running) → Stopped`. Any failure
//! inside a cycle is absorbed and logged; only the stop flag ends the loop.
//! The flag is checked at step boundaries only, so a tick in progress always
//! runs to completion, while the sleep phase reacts within one second.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::intake;
use crate::ledger::Ledger;
use crate::mirror;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Sleeping,
    Stopped,
}

pub struct Scheduler {
    config: Config,
    stop: Arc<AtomicBool>,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(config: Config, stop: Arc<AtomicBool>) -> Self {
        Self {
            config,
            stop,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run cycles until the stop flag is set. Never returns an error for
    /// sub-task failures; those are logged and the loop proceeds to sleep.
    pub fn run(&mut self, ledger: &mut Ledger) -> Result<()> {
        info!(
            interval_minutes = self.config.interval_minutes,
            "scheduler starting"
        );

        while !self.stop_requested() {
            self.state = SchedulerState::Running;
            self.run_cycle(ledger);

            if self.stop_requested() {
                break;
            }

            self.state = SchedulerState::Sleeping;
            if !self.sleep_between_cycles() {
                break;
            }
        }

        self.state = SchedulerState::Stopped;
        info!("scheduler stopped");
        Ok(())
    }

    /// One cycle: intake tick first, then both mirror pairs, in fixed order.
    fn run_cycle(&self, ledger: &mut Ledger) {
        match intake::run_tick(&self.config, ledger) {
            Ok(report) => info!(
                processed = report.processed,
                skipped = report.skipped,
                failed = report.failed,
                "intake tick complete"
            ),
            Err(e) => error!("intake tick failed: {e:#}"),
        }

        for (label, source, dest) in self.config.mirror_pairs() {
            let report = mirror::sync_pair(source, dest);
            info!(
                pair = label,
                copied = report.copied,
                skipped = report.skipped,
                failed = report.failed,
                "mirror pass complete"
            );
        }
    }

    /// Sleep `interval_minutes` in one-second steps, checking the stop flag
    /// each step. Returns false when the sleep was interrupted by a stop.
    fn sleep_between_cycles(&self) -> bool {
        let steps = self.config.interval_minutes * 60;
        for _ in 0..steps {
            if self.stop_requested() {
                return false;
            }
            thread::sleep(Duration::from_secs(1));
        }
        true
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::TempDir;

    fn test_config(root: &Path) -> Config {
        Config {
            raw_file_source: root.join("drop"),
            primary_process_dest: root.join("primary"),
            secondary_process_dest: root.join("secondary"),
            primary_copy_source: root.join("ref_a"),
            primary_copy_dest: root.join("rep_a"),
            secondary_copy_source: root.join("ref_b"),
            secondary_copy_dest: root.join("rep_b"),
            interval_minutes: 1,
            record_process: root.join("processed.txt"),
            log_folder: root.join("logs"),
            primary_prefix: "F".to_string(),
            secondary_marker: "NZL".to_string(),
        }
    }

    #[test]
    fn test_stop_during_sleep_is_prompt() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.raw_file_source).unwrap();
        fs::write(config.raw_file_source.join("F001.csv"), "id\n1\n").unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let stop_handle = Arc::clone(&stop);
        let record_path = config.record_process.clone();

        let worker = thread::spawn(move || {
            let mut ledger = Ledger::load_or_create(&record_path).unwrap();
            let mut scheduler = Scheduler::new(config, stop_handle);
            scheduler.run(&mut ledger).unwrap();
            scheduler.state()
        });

        // Let the first cycle finish and the sleep phase begin.
        thread::sleep(Duration::from_millis(500));
        let signalled = Instant::now();
        stop.store(true, Ordering::SeqCst);

        let state = worker.join().unwrap();
        // Shutdown latency is bounded by one sleep step.
        assert!(signalled.elapsed() < Duration::from_millis(1500));
        assert_eq!(state, SchedulerState::Stopped);
    }

    #[test]
    fn test_cycle_runs_before_first_sleep() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.raw_file_source).unwrap();
        fs::write(config.raw_file_source.join("F001.csv"), "id\n1\n").unwrap();
        let artifact = config.primary_process_dest.join("F001.tsv");

        let stop = Arc::new(AtomicBool::new(false));
        let stop_handle = Arc::clone(&stop);
        let record_path = config.record_process.clone();

        let worker = thread::spawn(move || {
            let mut ledger = Ledger::load_or_create(&record_path).unwrap();
            let mut scheduler = Scheduler::new(config, stop_handle);
            scheduler.run(&mut ledger).unwrap();
        });

        thread::sleep(Duration::from_millis(500));
        stop.store(true, Ordering::SeqCst);
        worker.join().unwrap();

        // A tick in progress completes even though a stop arrived later.
        assert!(artifact.exists());
    }

    #[test]
    fn test_stop_set_before_run_means_no_cycle() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.raw_file_source).unwrap();
        fs::write(config.raw_file_source.join("F001.csv"), "id\n1\n").unwrap();
        let artifact = config.primary_process_dest.join("F001.tsv");

        let stop = Arc::new(AtomicBool::new(true));
        let mut ledger = Ledger::load_or_create(&config.record_process).unwrap();
        let mut scheduler = Scheduler::new(config, stop);
        scheduler.run(&mut ledger).unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(!artifact.exists());
    }

    #[test]
    fn test_cycle_failures_do_not_stop_the_loop() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        // No drop folder at all: every intake tick fails.

        let stop = Arc::new(AtomicBool::new(false));
        let stop_handle = Arc::clone(&stop);
        let record_path = config.record_process.clone();

        let worker = thread::spawn(move || {
            let mut ledger = Ledger::load_or_create(&record_path).unwrap();
            let mut scheduler = Scheduler::new(config, stop_handle);
            scheduler.run(&mut ledger).unwrap();
            scheduler.state()
        });

        thread::sleep(Duration::from_millis(300));
        assert!(!worker.is_finished());
        stop.store(true, Ordering::SeqCst);
        assert_eq!(worker.join().unwrap(), SchedulerState::Stopped);
    }
}
