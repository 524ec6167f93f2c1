//! Bounded ring of recent child output lines, for the status console.
//!
//! This buffer is display-only: lines are never forwarded to the durable log,
//! since the supervised process already writes its own. Lines that do not
//! carry a recognizable timestamp get one prefixed on arrival.

use chrono::Local;
use std::collections::VecDeque;

/// How many recent lines the console retains.
pub const OUTPUT_WINDOW: usize = 30;

#[derive(Debug)]
pub struct OutputRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl OutputRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a line, timestamping it if needed and discarding the oldest
    /// line once the window is full.
    pub fn push(&mut self, line: String) {
        let line = if has_leading_timestamp(&line) {
            line
        } else {
            format!("[{}] {line}", Local::now().format("%Y-%m-%d %H:%M:%S"))
        };

        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Snapshot of the retained lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for OutputRing {
    fn default() -> Self {
        Self::new(OUTPUT_WINDOW)
    }
}

/// Recognize lines already carrying a timestamp: either a `YYYY-` date start
/// (tracing's default format) or a `[YYYY-` bracketed prefix.
fn has_leading_timestamp(line: &str) -> bool {
    let candidate = line.strip_prefix('[').unwrap_or(line);
    let bytes = candidate.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}
