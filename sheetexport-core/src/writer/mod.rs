//! Writer module for preparing workbook copies before export

mod xlsx_writer;

pub use xlsx_writer::{WorkbookEdits, apply_workbook_edits_xlsx};

use anyhow::Result;
use std::path::Path;

/// Write a copy of `input_path` with `edits` applied to `output_path`
pub fn apply_workbook_edits<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    edits: &WorkbookEdits,
) -> Result<()> {
    let input = input_path.as_ref();

    match input.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm") => {
            apply_workbook_edits_xlsx(input, output_path.as_ref(), edits)
        }
        _ => anyhow::bail!("Unsupported file format: {}", input.display()),
    }
}

/// Render a print titles reference such as `'Baseline content'!$2:$4`
pub fn print_titles_reference(sheet: &str, rows: &crate::reference::RowRange) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), rows)
}
