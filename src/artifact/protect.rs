//! Finalize/protect step: marks a written document access-controlled.
//!
//! This is a best-effort side effect. The caller logs a failure as a warning
//! and continues; protection never blocks artifact production.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Apply restrictive permissions to a written document.
pub fn protect(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to stat document: {}", path.display()))?;
    let mut perms = metadata.permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to protect document: {}", path.display()))?;
    Ok(())
}
