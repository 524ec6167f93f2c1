//! File-name classification for the drop folder.
//!
//! Classification is a pure function of the name string; the file is never
//! opened. Names that match neither pattern are ignored entirely.

/// Extension accepted for incoming exports, compared case-insensitively.
pub const SOURCE_EXTENSION: &str = ".csv";

/// Processing category for a drop-folder entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Name starts with the configured prefix.
    Primary,
    /// Name contains the configured marker substring.
    Secondary,
    /// Everything else; never processed.
    Ignore,
}

impl Category {
    /// Label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Primary => "primary",
            Category::Secondary => "secondary",
            Category::Ignore => "ignore",
        }
    }
}

/// Name patterns selecting each category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingRules {
    pub primary_prefix: String,
    pub secondary_marker: String,
}

/// Classify a file name.
///
/// The primary rule is checked first, so a name matching both patterns is
/// classified primary. Prefix and marker comparisons are case-sensitive; the
/// extension check is not.
pub fn classify(name: &str, rules: &NamingRules) -> Category {
    if !name.to_ascii_lowercase().ends_with(SOURCE_EXTENSION) {
        return Category::Ignore;
    }
    if name.starts_with(&rules.primary_prefix) {
        return Category::Primary;
    }
    if name.contains(&rules.secondary_marker) {
        return Category::Secondary;
    }
    Category::Ignore
}
