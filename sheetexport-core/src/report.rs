//! Report naming and size formatting

use std::path::{Path, PathBuf};

/// Document id and revision read from the identity sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIdentity {
    pub id: String,
    pub revision: String,
}

impl DocumentIdentity {
    pub fn new(id: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: revision.into(),
        }
    }

    /// `<id> rev <revision> <suffix>.pdf`
    pub fn report_file_name(&self, suffix: &str) -> String {
        format!("{} rev {} {}.pdf", self.id, self.revision, suffix)
    }

    /// Report path next to the workbook
    pub fn report_path(&self, dir: &Path, suffix: &str) -> PathBuf {
        dir.join(self.report_file_name(suffix))
    }
}

/// Size in binary megabytes (bytes / 1024²)
pub fn size_in_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Size with two decimals, e.g. `1.50 MB`
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", size_in_mb(bytes))
}
