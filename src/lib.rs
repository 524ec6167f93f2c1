pub mod artifact;
pub mod classify;
pub mod commands;
pub mod config;
pub mod intake;
pub mod ledger;
pub mod logging;
pub mod mirror;
pub mod process;
pub mod scheduler;
pub mod watchdog;
