//! Category-specific layout applied to a parsed table before persisting.
//!
//! Layouts mutate the document in place. The styling detail lives behind this
//! trait so the build pipeline only depends on the contract: apply or fail.

use thiserror::Error;

use super::table::Table;
use crate::classify::Category;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct LayoutError(pub String);

/// A cell-level layout pass over a writable tabular document.
pub trait Layout {
    fn apply(&self, table: &mut Table) -> Result<(), LayoutError>;
}

/// Layout for the category selected for processable drop files, or `None`
/// for the ignore bucket.
pub fn layout_for(category: Category) -> Option<Box<dyn Layout>> {
    match category {
        Category::Primary => Some(Box::new(PrimaryLayout)),
        Category::Secondary => Some(Box::new(SecondaryLayout)),
        Category::Ignore => None,
    }
}

fn require_headers(table: &Table) -> Result<(), LayoutError> {
    if table.headers.is_empty() {
        return Err(LayoutError("document has no header row".to_string()));
    }
    Ok(())
}

/// Columns must be addressable by name once normalized; a duplicate header
/// cannot be placed.
fn require_unique_headers(table: &Table) -> Result<(), LayoutError> {
    let mut seen = std::collections::HashSet::new();
    for header in &table.headers {
        if !seen.insert(header.as_str()) {
            return Err(LayoutError(format!("duplicate column {header:?}")));
        }
    }
    Ok(())
}

fn normalize_cells(table: &mut Table) {
    for row in &mut table.rows {
        for cell in row {
            let trimmed = cell.trim();
            if trimmed.len() != cell.len() {
                *cell = trimmed.to_string();
            }
        }
    }
}

/// Primary exports: upper-cased headers, trimmed cells.
pub struct PrimaryLayout;

impl Layout for PrimaryLayout {
    fn apply(&self, table: &mut Table) -> Result<(), LayoutError> {
        require_headers(table)?;
        for header in &mut table.headers {
            *header = header.trim().to_ascii_uppercase();
        }
        require_unique_headers(table)?;
        normalize_cells(table);
        Ok(())
    }
}

/// Secondary exports: upper-cased headers, trimmed cells, and short rows
/// padded to the header width. Rows wider than the header row indicate a
/// schema the layout cannot place and are rejected.
pub struct SecondaryLayout;

impl Layout for SecondaryLayout {
    fn apply(&self, table: &mut Table) -> Result<(), LayoutError> {
        require_headers(table)?;
        let width = table.headers.len();
        for header in &mut table.headers {
            *header = header.trim().to_ascii_uppercase();
        }
        require_unique_headers(table)?;
        normalize_cells(table);
        for (idx, row) in table.rows.iter_mut().enumerate() {
            if row.len() > width {
                return Err(LayoutError(format!(
                    "row {} has {} cells but the header row has {width}",
                    idx + 1,
                    row.len()
                )));
            }
            row.resize(width, String::new());
        }
        Ok(())
    }
}
