//! CLI entry points. Each command loads the config, initializes logging, and
//! wires the components together; fatal startup errors propagate out of
//! `execute` and exit the process non-zero.

pub mod run;
pub mod tick;
pub mod watch;
