//! Process helpers used by the watchdog.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io;
use std::process::{Child, ExitStatus};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Check whether a process with the given PID is alive.
///
/// Sends the null signal: the kernel distinguishes "exists" (including
/// permission-denied) from "no such process" without delivering anything.
pub fn is_process_alive(pid: u32) -> bool {
    let pid_i32 = match i32::try_from(pid) {
        Ok(v) => v,
        Err(_) => return false,
    };

    match kill(Pid::from_raw(pid_i32), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Terminate a child gracefully: SIGTERM, wait up to `grace`, then SIGKILL.
///
/// Always reaps the child before returning.
pub fn terminate_gracefully(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Ok(pid) = i32::try_from(child.id()) {
        // Delivery can fail if the child already exited; wait below reaps it.
        let _ = kill(Pid::from_raw(pid), Signal::SIGTERM);
    }

    match child.wait_timeout(grace)? {
        Some(status) => Ok(status),
        None => {
            child.kill()?;
            child.wait()
        }
    }
}
