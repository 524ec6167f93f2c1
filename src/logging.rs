//! Tracing setup: a size-rotated file writer plus a console mirror.
//!
//! Rotation renames the active log to `conveyor_<timestamp>.log` when it
//! would exceed the size cap and starts a fresh file. Rotated files are
//! retained indefinitely for audit; nothing is deleted.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Base name of the active log file.
const LOG_BASE: &str = "conveyor";

const MAX_LOG_FILE_SIZE: u64 = 20 * 1024 * 1024;

const DEFAULT_LOG_FILTER: &str = "conveyor=info";

/// Initialize tracing with the rotating file writer and a stderr mirror.
///
/// `RUST_LOG` overrides the default filter; `--verbose` raises the console
/// to debug. Call once per process; a second call is an error.
pub fn init(log_folder: &Path, verbose: bool) -> Result<()> {
    let file_writer = SharedRotatingWriter::new(log_folder.to_path_buf())
        .context("Failed to initialize rotating log writer")?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if verbose {
        EnvFilter::new("conveyor=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}

/// Console-only initialization for the watchdog.
///
/// The supervised child owns the durable log file; the watchdog writing to
/// the same file would duplicate every line the child already logged.
pub fn init_console(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("conveyor=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(filter),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}

struct RotatingFileAppender {
    dir: PathBuf,
    max_size: u64,
    file: Option<File>,
    current_size: u64,
}

impl RotatingFileAppender {
    fn new(dir: PathBuf, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let mut appender = Self {
            dir,
            max_size,
            file: None,
            current_size: 0,
        };
        let (file, size) = appender.open_current_file()?;
        appender.file = Some(file);
        appender.current_size = size;
        if appender.current_size > appender.max_size {
            appender.rotate()?;
        }
        Ok(appender)
    }

    fn open_current_file(&self) -> io::Result<(File, u64)> {
        let path = self.current_path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok((file, size))
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{LOG_BASE}.log"))
    }

    /// Close the active file and rename it with the rotation timestamp.
    /// Rotating twice within one second appends a counter to stay unique.
    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        let current = self.current_path();
        if current.exists() {
            let stamp = Local::now().format("%Y%m%d_%H%M%S");
            let mut target = self.dir.join(format!("{LOG_BASE}_{stamp}.log"));
            let mut counter = 1;
            while target.exists() {
                target = self.dir.join(format!("{LOG_BASE}_{stamp}_{counter}.log"));
                counter += 1;
            }
            fs::rename(&current, &target)?;
        }

        let (file, size) = self.open_current_file()?;
        self.file = Some(file);
        self.current_size = size;
        Ok(())
    }
}

impl Write for RotatingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.current_size + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let bytes = file.write(buf)?;
        self.current_size += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

#[derive(Clone)]
struct SharedRotatingWriter {
    inner: Arc<Mutex<RotatingFileAppender>>,
}

impl SharedRotatingWriter {
    fn new(dir: PathBuf) -> Result<Self> {
        let appender = RotatingFileAppender::new(dir.clone(), MAX_LOG_FILE_SIZE)
            .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(appender)),
        })
    }
}

struct SharedRotatingWriterGuard {
    inner: Arc<Mutex<RotatingFileAppender>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRotatingWriter {
    type Writer = SharedRotatingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedRotatingWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedRotatingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.flush()
    }
}
