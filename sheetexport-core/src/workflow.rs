//! The export workflow: identity cells, confirmations, page setup, PDF export

use crate::automation::{
    AutomationLauncher, AutomationSession, ExportOptions, SessionOptions, SpreadsheetAutomation,
};
use crate::config::ExportConfig;
use crate::error::{AutomationError, AutomationResult};
use crate::prompt::{Notice, Prompter, Question};
use crate::reference::{CellRef, RowRange};
use crate::report::{DocumentIdentity, format_size_mb, size_in_mb};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Why the user stopped the export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    OverwriteDeclined,
    SaveDeclined,
}

/// Result of one export run
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Exported { path: PathBuf, bytes: u64 },
    Cancelled(Cancellation),
    Failed(String),
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExportOutcome::Exported { .. })
    }

    /// Report size in binary megabytes, for successful exports
    pub fn size_mb(&self) -> Option<f64> {
        match self {
            ExportOutcome::Exported { bytes, .. } => Some(size_in_mb(*bytes)),
            _ => None,
        }
    }
}

/// Exports the configured sheets of a workbook to a PDF report
pub struct ReportExporter<L: AutomationLauncher> {
    launcher: L,
    config: ExportConfig,
}

impl<L: AutomationLauncher> ReportExporter<L> {
    pub fn new(launcher: L) -> Self {
        Self::with_config(launcher, ExportConfig::default())
    }

    pub fn with_config(launcher: L, config: ExportConfig) -> Self {
        Self { launcher, config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Run the workflow. Errors never escape: they are reported through the
    /// prompter and returned as [`ExportOutcome::Failed`].
    pub fn export<P: Prompter + ?Sized>(&self, workbook: &Path, prompter: &mut P) -> ExportOutcome {
        match self.try_export(workbook, prompter) {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("Failed to save PDF: {}", e);
                error!("{}", message);
                prompter.notify(&Notice::error("Error", message.as_str()));
                ExportOutcome::Failed(message)
            }
        }
    }

    fn try_export<P: Prompter + ?Sized>(
        &self,
        workbook: &Path,
        prompter: &mut P,
    ) -> AutomationResult<ExportOutcome> {
        let mut session = AutomationSession::start(
            &self.launcher,
            &SessionOptions::background(),
            &self.config.identity_sheet,
        )?;

        let workbook = std::path::absolute(workbook)?;
        info!("Opening workbook: {}", workbook.display());
        session.open_workbook(&workbook)?;

        let identity = self.read_identity(&mut session)?;
        info!("Document ID: {}", identity.id);
        info!("Document Revision: {}", identity.revision);

        let dir = workbook.parent().unwrap_or_else(|| Path::new(""));
        let report_path = identity.report_path(dir, &self.config.report_suffix);

        if report_path.exists() {
            let question = Question::yes_no(
                "File Exists",
                format!(
                    "A file with this name already exists:\n\n{}\n\nDo you want to overwrite it?",
                    report_path.display()
                ),
            )
            .as_warning();
            if !prompter.confirm(&question) {
                info!("User cancelled - file already exists");
                prompter.notify(&Notice::info("Cancelled", "PDF save cancelled."));
                return Ok(ExportOutcome::Cancelled(Cancellation::OverwriteDeclined));
            }
        }

        let shown = report_path.display().to_string();
        let question = Question::ok_cancel(
            "Save PDF",
            format!(
                "Do you want to save the baseline document as a PDF?\n\nSaving as: {}\nPath length: {} characters",
                shown,
                shown.chars().count()
            ),
        );
        if !prompter.confirm(&question) {
            info!("User cancelled save operation");
            return Ok(ExportOutcome::Cancelled(Cancellation::SaveDeclined));
        }

        for titles in &self.config.print_titles {
            info!("Configuring {} page setup...", titles.sheet);
            let rows: RowRange = titles.rows.parse()?;
            session.set_print_titles(&titles.sheet, rows)?;
        }

        info!("Selecting sheets: {}", self.config.export_sheets.join(", "));
        session.select_sheets(&self.config.export_sheets)?;

        let report_path = std::path::absolute(&report_path)?;
        info!("Exporting to PDF: {}", report_path.display());
        session.export_fixed_format(&report_path, &ExportOptions::pdf(self.config.quality))?;

        match fs::metadata(&report_path) {
            Ok(meta) if meta.is_file() => {
                let bytes = meta.len();
                prompter.notify(&Notice::info(
                    "Success",
                    format!(
                        "PDF saved successfully!\n\n{}\n\nFile size: {}",
                        report_path.display(),
                        format_size_mb(bytes)
                    ),
                ));
                info!("SUCCESS: PDF created ({})", format_size_mb(bytes));
                Ok(ExportOutcome::Exported {
                    path: report_path,
                    bytes,
                })
            }
            _ => {
                prompter.notify(&Notice::error(
                    "Save Failed",
                    format!(
                        "Error: PDF file was not saved successfully!\n\nExpected location: {}",
                        report_path.display()
                    ),
                ));
                error!("PDF file was not created");
                Ok(ExportOutcome::Failed(format!(
                    "PDF file was not created: {}",
                    report_path.display()
                )))
            }
        }
    }

    fn read_identity<A: SpreadsheetAutomation>(
        &self,
        session: &mut AutomationSession<A>,
    ) -> AutomationResult<DocumentIdentity> {
        let id = self.read_text(session, &self.config.doc_id_cell)?;
        let revision = self.read_text(session, &self.config.doc_rev_cell)?;
        Ok(DocumentIdentity::new(id, revision))
    }

    fn read_text<A: SpreadsheetAutomation>(
        &self,
        session: &mut AutomationSession<A>,
        cell: &str,
    ) -> AutomationResult<String> {
        let sheet = &self.config.identity_sheet;
        let cell: CellRef = cell.parse()?;
        session
            .read_cell(sheet, cell)?
            .to_text()
            .ok_or_else(|| AutomationError::EmptyCell {
                sheet: sheet.clone(),
                cell: cell.to_string(),
            })
    }
}
