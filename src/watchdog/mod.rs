//! Supervision of the scheduler child process.
//!
//! The watchdog spawns the scheduler with piped output, drains that output
//! into a bounded queue from dedicated threads, and folds the queue into a
//! 30-line ring buffer on each poll. An unplanned child exit schedules exactly
//! one restart after a fixed delay; a user-requested stop suppresses any
//! restart and escalates from graceful termination to a forced kill.

pub mod ring;

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::process::{is_process_alive, terminate_gracefully};
use ring::OutputRing;

/// Delay between an unplanned child exit and its restart.
pub const RESTART_DELAY: Duration = Duration::from_secs(10);

/// How long a graceful stop waits before force-killing the child.
pub const STOP_GRACE: Duration = Duration::from_secs(10);

/// Depth of the bounded queue between the drainer threads and the poller.
const OUTPUT_QUEUE_DEPTH: usize = 256;

/// Observable state of the supervised child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NotRunning,
    Running,
    /// Child exited without a stop request; a restart is pending.
    Crashed,
}

impl SupervisorState {
    pub fn label(&self) -> &'static str {
        match self {
            SupervisorState::NotRunning => "not running",
            SupervisorState::Running => "running",
            SupervisorState::Crashed => "crashed",
        }
    }
}

/// Supervisor for one child command.
///
/// Single-threaded driver: the owner calls [`Watchdog::poll`] on a short
/// interval; only the output drainer threads run concurrently, and they share
/// nothing with the owner but the bounded queue.
pub struct Watchdog {
    program: PathBuf,
    args: Vec<String>,
    restart_delay: Duration,
    grace: Duration,
    state: SupervisorState,
    child: Option<Child>,
    output_rx: Option<Receiver<String>>,
    ring: OutputRing,
    user_stop_requested: bool,
    restart_due: Option<Instant>,
    restarts: u64,
}

impl Watchdog {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            restart_delay: RESTART_DELAY,
            grace: STOP_GRACE,
            state: SupervisorState::NotRunning,
            child: None,
            output_rx: None,
            ring: OutputRing::default(),
            user_stop_requested: false,
            restart_due: None,
            restarts: 0,
        }
    }

    /// Override the restart delay and stop grace period.
    pub fn with_timings(mut self, restart_delay: Duration, grace: Duration) -> Self {
        self.restart_delay = restart_delay;
        self.grace = grace;
        self
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// How many times the child has been restarted after a crash.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn child_pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Probe the child with the null signal. `try_wait` in [`Watchdog::poll`]
    /// is the authoritative exit check; this answers "responding right now"
    /// for the status console without reaping anything.
    pub fn child_alive(&self) -> bool {
        self.child_pid().is_some_and(is_process_alive)
    }

    /// Snapshot of the retained output window, oldest first.
    pub fn output(&self) -> Vec<String> {
        self.ring.snapshot()
    }

    /// Spawn the supervised child. Already running is a no-op with a warning.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.state == SupervisorState::Running {
            warn!("supervised process already running, ignoring start");
            return Ok(());
        }
        self.user_stop_requested = false;
        self.restart_due = None;
        self.spawn()
    }

    fn spawn(&mut self) -> anyhow::Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                anyhow::anyhow!("Failed to spawn {}: {e}", self.program.display())
            })?;

        let (tx, rx) = mpsc::sync_channel(OUTPUT_QUEUE_DEPTH);
        if let Some(stdout) = child.stdout.take() {
            spawn_drainer(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_drainer(stderr, tx);
        }

        info!(pid = child.id(), "supervised process started");
        self.child = Some(child);
        self.output_rx = Some(rx);
        self.state = SupervisorState::Running;
        Ok(())
    }

    /// One supervision step: fold queued output into the ring, check child
    /// liveness, and fire a due restart. Call on a short interval (~1s).
    pub fn poll(&mut self) -> SupervisorState {
        self.drain_output();

        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    self.child = None;
                    // Pick up any trailing lines the drainers queued.
                    self.drain_output();
                    if self.user_stop_requested {
                        info!(%status, "supervised process exited after stop request");
                        self.state = SupervisorState::NotRunning;
                    } else {
                        warn!(
                            %status,
                            delay_secs = self.restart_delay.as_secs_f64(),
                            "supervised process exited unexpectedly, scheduling restart"
                        );
                        self.state = SupervisorState::Crashed;
                        self.restart_due = Some(Instant::now() + self.restart_delay);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("failed to poll supervised process: {e}"),
            }
        }

        if let Some(due) = self.restart_due {
            if !self.user_stop_requested && Instant::now() >= due {
                self.restart_due = None;
                info!("restarting supervised process");
                match self.spawn() {
                    Ok(()) => self.restarts += 1,
                    Err(e) => {
                        error!("restart failed: {e:#}");
                        self.state = SupervisorState::NotRunning;
                    }
                }
            }
        }

        self.state
    }

    /// Stop the child: graceful termination first, forced kill after the
    /// grace period. Always ends in `NotRunning`; any pending restart is
    /// cancelled.
    pub fn stop(&mut self) {
        self.user_stop_requested = true;
        self.restart_due = None;

        if let Some(mut child) = self.child.take() {
            info!(pid = child.id(), "stopping supervised process");
            match terminate_gracefully(&mut child, self.grace) {
                Ok(status) => info!(%status, "supervised process stopped"),
                Err(e) => warn!("error while stopping supervised process: {e}"),
            }
        }

        self.drain_output();
        self.state = SupervisorState::NotRunning;
    }

    fn drain_output(&mut self) {
        let Some(rx) = self.output_rx.as_ref() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(line) => self.ring.push(line),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.output_rx = None;
                    break;
                }
            }
        }
    }
}

/// Read lines from one child pipe into the shared queue until the pipe
/// closes or the consumer goes away.
fn spawn_drainer<R: Read + Send + 'static>(pipe: R, tx: SyncSender<String>) {
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
}
