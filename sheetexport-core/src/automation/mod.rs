//! Spreadsheet application automation interface
//!
//! The workflow talks to the office application only through
//! [`SpreadsheetAutomation`]. Sessions are acquired through an
//! [`AutomationLauncher`] and wrapped in an [`AutomationSession`], which closes
//! the workbook and quits the application when it goes out of scope.

pub mod office;

use crate::error::AutomationResult;
use crate::reference::{CellRef, RowRange};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub use office::{OfficeLauncher, OfficeSession};

/// How the application session is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Show the application window
    pub visible: bool,
    /// Let the application raise its own alert dialogs
    pub display_alerts: bool,
}

impl SessionOptions {
    /// No window, no application dialogs
    pub fn background() -> Self {
        Self {
            visible: false,
            display_alerts: false,
        }
    }
}

/// Fixed format targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedFormat {
    Pdf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    #[default]
    Standard,
    Minimum,
}

/// Parameters of the "export as fixed format" operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: FixedFormat,
    pub quality: ExportQuality,
    pub include_doc_properties: bool,
    pub ignore_print_areas: bool,
    pub open_after_publish: bool,
}

impl ExportOptions {
    /// PDF with document properties, honoring print areas, not opened afterwards
    pub fn pdf(quality: ExportQuality) -> Self {
        Self {
            format: FixedFormat::Pdf,
            quality,
            include_doc_properties: true,
            ignore_print_areas: false,
            open_after_publish: false,
        }
    }
}

/// Value read from a worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Error(String),
}

impl CellValue {
    /// Coerce to text. Integral numbers drop the fractional part.
    /// Returns `None` for empty cells.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::Error(e) => Some(e.clone()),
        }
    }
}

/// Operations the export workflow needs from a spreadsheet application
pub trait SpreadsheetAutomation {
    /// Open a workbook from an absolute path
    fn open(&mut self, path: &Path) -> AutomationResult<()>;
    fn read_cell(&mut self, sheet: &str, cell: CellRef) -> AutomationResult<CellValue>;
    /// Set the rows repeated at the top of every printed page of `sheet`
    fn set_print_titles(&mut self, sheet: &str, rows: RowRange) -> AutomationResult<()>;
    /// Replace the sheet selection. Every sheet must exist.
    fn select_sheets(&mut self, sheets: &[String]) -> AutomationResult<()>;
    /// Export the current selection to `output`
    fn export_fixed_format(&mut self, output: &Path, options: &ExportOptions)
    -> AutomationResult<()>;
    fn close(&mut self, save_changes: bool) -> AutomationResult<()>;
    fn quit(&mut self) -> AutomationResult<()>;
}

/// Starts application sessions
pub trait AutomationLauncher {
    type Session: SpreadsheetAutomation;

    fn launch(&self, options: &SessionOptions) -> AutomationResult<Self::Session>;
}

/// Scoped application session.
///
/// Dropping the session reselects `home_sheet` and closes the open workbook
/// without saving, then quits the application. Both steps run at most once and
/// their failures are only logged.
pub struct AutomationSession<A: SpreadsheetAutomation> {
    app: A,
    home_sheet: String,
    workbook_open: bool,
    released: bool,
}

impl<A: SpreadsheetAutomation> AutomationSession<A> {
    pub fn start<L>(launcher: &L, options: &SessionOptions, home_sheet: &str) -> AutomationResult<Self>
    where
        L: AutomationLauncher<Session = A>,
    {
        let app = launcher.launch(options)?;
        Ok(Self {
            app,
            home_sheet: home_sheet.to_string(),
            workbook_open: false,
            released: false,
        })
    }

    pub fn open_workbook(&mut self, path: &Path) -> AutomationResult<()> {
        self.app.open(path)?;
        self.workbook_open = true;
        Ok(())
    }

    pub fn read_cell(&mut self, sheet: &str, cell: CellRef) -> AutomationResult<CellValue> {
        self.app.read_cell(sheet, cell)
    }

    pub fn set_print_titles(&mut self, sheet: &str, rows: RowRange) -> AutomationResult<()> {
        self.app.set_print_titles(sheet, rows)
    }

    pub fn select_sheets(&mut self, sheets: &[String]) -> AutomationResult<()> {
        self.app.select_sheets(sheets)
    }

    pub fn export_fixed_format(
        &mut self,
        output: &Path,
        options: &ExportOptions,
    ) -> AutomationResult<()> {
        self.app.export_fixed_format(output, options)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.workbook_open {
            self.workbook_open = false;
            // A missing home sheet must not keep the workbook open
            if let Err(e) = self.app.select_sheets(std::slice::from_ref(&self.home_sheet)) {
                debug!("Could not reselect '{}': {}", self.home_sheet, e);
            }
            match self.app.close(false) {
                Ok(()) => debug!("Workbook closed"),
                Err(e) => debug!("Ignoring failure while closing workbook: {}", e),
            }
        }

        match self.app.quit() {
            Ok(()) => debug!("Application session closed"),
            Err(e) => debug!("Ignoring failure while quitting application: {}", e),
        }
    }
}

impl<A: SpreadsheetAutomation> Drop for AutomationSession<A> {
    fn drop(&mut self) {
        self.release();
    }
}
