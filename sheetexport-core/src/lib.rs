//! sheetexport-core: export the report sheets of a workbook to PDF
//!
//! The workflow drives a spreadsheet application through the
//! [`SpreadsheetAutomation`] trait and talks to the user through a
//! [`Prompter`]. [`OfficeLauncher`] is the production adapter.

pub mod automation;
pub mod config;
pub mod error;
pub mod prompt;
pub mod reader;
pub mod reference;
pub mod report;
pub mod workflow;
pub mod writer;

pub use automation::{
    AutomationLauncher, AutomationSession, CellValue, ExportOptions, ExportQuality, OfficeLauncher,
    SessionOptions, SpreadsheetAutomation,
};
pub use config::ExportConfig;
pub use error::{AutomationError, AutomationResult};
pub use prompt::{Notice, NoticeKind, Prompter, Question, QuestionKind};
pub use reference::{CellRef, RowRange};
pub use report::DocumentIdentity;
pub use workflow::{Cancellation, ExportOutcome, ReportExporter};
