//! LibreOffice adapter
//!
//! Runs `soffice` headless. The workbook is staged into a private directory so
//! the original file is only written when a workbook is closed with
//! `save_changes`. Print titles and the sheet selection are kept as pending
//! [`WorkbookEdits`] and written into a render copy right before conversion.

use super::{
    AutomationLauncher, CellValue, ExportOptions, ExportQuality, FixedFormat, SessionOptions,
    SpreadsheetAutomation,
};
use crate::error::{AutomationError, AutomationResult};
use crate::reader::{self, SheetEntry};
use crate::reference::{CellRef, RowRange};
use crate::writer::{WorkbookEdits, apply_workbook_edits};
use serde_json::json;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, warn};
use url::Url;

/// Binary names probed on `PATH`
const OFFICE_BINARIES: [&str; 3] = ["soffice", "libreoffice", "soffice.exe"];

/// Base name of the render copy; the converter names its PDF after it
const RENDER_NAME: &str = "report";

/// Launches headless LibreOffice sessions
#[derive(Debug, Clone, Default)]
pub struct OfficeLauncher {
    binary: Option<PathBuf>,
}

impl OfficeLauncher {
    /// Locate the office binary on `PATH` at launch
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific office binary
    pub fn with_binary<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }
}

impl AutomationLauncher for OfficeLauncher {
    type Session = OfficeSession;

    fn launch(&self, options: &SessionOptions) -> AutomationResult<OfficeSession> {
        let binary = match &self.binary {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => {
                return Err(AutomationError::OfficeNotFound(path.display().to_string()));
            }
            None => find_office_binary()?,
        };

        let staging = tempfile::Builder::new()
            .prefix("sheetexport-")
            .tempdir()?;
        debug!(
            "Office session using {} (staging in {})",
            binary.display(),
            staging.path().display()
        );

        Ok(OfficeSession {
            binary,
            options: *options,
            staging: Some(staging),
            workbook: None,
        })
    }
}

fn find_office_binary() -> AutomationResult<PathBuf> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    env::split_paths(&path_var)
        .flat_map(|dir| OFFICE_BINARIES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            AutomationError::OfficeNotFound(format!(
                "none of {} found on PATH",
                OFFICE_BINARIES.join(", ")
            ))
        })
}

/// Workbook opened in a session
#[derive(Debug)]
struct OpenWorkbook {
    source: PathBuf,
    staged: PathBuf,
    sheets: Vec<SheetEntry>,
    edits: WorkbookEdits,
}

impl OpenWorkbook {
    fn ensure_sheet(&self, name: &str) -> AutomationResult<()> {
        if self.sheets.iter().any(|s| s.name == name) {
            Ok(())
        } else {
            Err(AutomationError::SheetNotFound(name.to_string()))
        }
    }

    fn extension(&self) -> &str {
        self.staged
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("xlsx")
    }
}

/// A headless LibreOffice session
#[derive(Debug)]
pub struct OfficeSession {
    binary: PathBuf,
    options: SessionOptions,
    staging: Option<TempDir>,
    workbook: Option<OpenWorkbook>,
}

impl OfficeSession {
    fn staging_dir(&self) -> AutomationResult<&Path> {
        self.staging
            .as_ref()
            .map(|dir| dir.path())
            .ok_or(AutomationError::SessionClosed)
    }

    fn workbook(&self) -> AutomationResult<&OpenWorkbook> {
        self.workbook.as_ref().ok_or(AutomationError::NoWorkbookOpen)
    }

    fn workbook_mut(&mut self) -> AutomationResult<&mut OpenWorkbook> {
        self.workbook.as_mut().ok_or(AutomationError::NoWorkbookOpen)
    }

    /// Arguments shared by every `soffice` invocation of this session
    fn session_args(&self, staging: &Path) -> AutomationResult<Vec<String>> {
        let mut args = vec![format!(
            "-env:UserInstallation={}",
            file_url(&staging.join("profile"))?
        )];
        if !self.options.visible {
            args.push("--headless".to_string());
        }
        if !self.options.display_alerts {
            args.extend(
                ["--norestore", "--nologo", "--nolockcheck", "--nodefault"].map(String::from),
            );
        }
        Ok(args)
    }
}

impl SpreadsheetAutomation for OfficeSession {
    fn open(&mut self, path: &Path) -> AutomationResult<()> {
        if let Some(open) = &self.workbook {
            return Err(AutomationError::AlreadyOpen(open.source.clone()));
        }

        let source = std::path::absolute(path)?;
        if !reader::is_workbook_path(&source) {
            return Err(AutomationError::UnsupportedFormat(source));
        }

        let extension = source
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("xlsx")
            .to_ascii_lowercase();
        let staged = self.staging_dir()?.join(format!("workbook.{}", extension));
        fs::copy(&source, &staged)?;

        let sheets = reader::read_sheet_entries(&staged)?;
        reader::validate_workbook(&staged)?;
        debug!("Staged {} with {} sheets", source.display(), sheets.len());

        self.workbook = Some(OpenWorkbook {
            source,
            staged,
            sheets,
            edits: WorkbookEdits::default(),
        });
        Ok(())
    }

    fn read_cell(&mut self, sheet: &str, cell: CellRef) -> AutomationResult<CellValue> {
        let workbook = self.workbook()?;
        workbook.ensure_sheet(sheet)?;
        reader::read_cell(&workbook.staged, sheet, cell)
    }

    fn set_print_titles(&mut self, sheet: &str, rows: RowRange) -> AutomationResult<()> {
        let workbook = self.workbook_mut()?;
        workbook.ensure_sheet(sheet)?;
        workbook.edits.print_titles.insert(sheet.to_string(), rows);
        Ok(())
    }

    fn select_sheets(&mut self, sheets: &[String]) -> AutomationResult<()> {
        let workbook = self.workbook_mut()?;
        if sheets.is_empty() {
            return Err(AutomationError::InvalidReference(
                "empty sheet selection".to_string(),
            ));
        }
        for sheet in sheets {
            workbook.ensure_sheet(sheet)?;
        }
        workbook.edits.selected_sheets = Some(sheets.to_vec());
        Ok(())
    }

    fn export_fixed_format(
        &mut self,
        output: &Path,
        options: &ExportOptions,
    ) -> AutomationResult<()> {
        let staging = self.staging_dir()?.to_path_buf();
        let workbook = self.workbook()?;

        let render_dir = staging.join("render");
        let pdf_dir = staging.join("pdf");
        fs::create_dir_all(&render_dir)?;
        fs::create_dir_all(&pdf_dir)?;

        let rendered = render_dir.join(format!("{}.{}", RENDER_NAME, workbook.extension()));
        let edits = WorkbookEdits {
            clear_print_areas: options.ignore_print_areas,
            strip_doc_properties: !options.include_doc_properties,
            ..workbook.edits.clone()
        };
        apply_workbook_edits(&workbook.staged, &rendered, &edits)?;

        let result = Command::new(&self.binary)
            .args(self.session_args(&staging)?)
            .arg("--convert-to")
            .arg(convert_filter(options))
            .arg("--outdir")
            .arg(&pdf_dir)
            .arg(&rendered)
            .output()?;

        if !result.status.success() {
            return Err(AutomationError::ConversionFailed(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        let produced = pdf_dir.join(format!("{}.pdf", RENDER_NAME));
        if !produced.is_file() {
            return Err(AutomationError::ConversionFailed(format!(
                "no PDF produced: {}",
                String::from_utf8_lossy(&result.stdout).trim()
            )));
        }
        move_file(&produced, output)?;

        if options.open_after_publish {
            warn!("Opening the exported PDF is not supported in headless sessions");
        }
        Ok(())
    }

    fn close(&mut self, save_changes: bool) -> AutomationResult<()> {
        let workbook = self.workbook.take().ok_or(AutomationError::NoWorkbookOpen)?;

        if save_changes {
            let saved = workbook.staged.with_file_name(format!("saved.{}", workbook.extension()));
            apply_workbook_edits(&workbook.staged, &saved, &workbook.edits.persistent())?;
            move_file(&saved, &workbook.source)?;
            debug!("Saved changes to {}", workbook.source.display());
        }

        match fs::remove_file(&workbook.staged) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn quit(&mut self) -> AutomationResult<()> {
        self.workbook = None;
        if let Some(staging) = self.staging.take() {
            staging.close()?;
        }
        Ok(())
    }
}

/// `--convert-to` argument for the Calc PDF export filter
fn convert_filter(options: &ExportOptions) -> String {
    let filter = match options.quality {
        ExportQuality::Standard => json!({
            "ReduceImageResolution": { "type": "boolean", "value": "false" },
            "Quality": { "type": "long", "value": "90" },
        }),
        ExportQuality::Minimum => json!({
            "ReduceImageResolution": { "type": "boolean", "value": "true" },
            "MaxImageResolution": { "type": "long", "value": "150" },
            "Quality": { "type": "long", "value": "50" },
        }),
    };
    let format = match options.format {
        FixedFormat::Pdf => "pdf",
    };
    format!("{}:calc_pdf_Export:{}", format, filter)
}

/// `file://` URL of an absolute path
fn file_url(path: &Path) -> AutomationResult<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| {
            AutomationError::InvalidReference(format!("not an absolute path: {}", path.display()))
        })
}

/// Rename, falling back to copy for moves across filesystems
fn move_file(from: &Path, to: &Path) -> AutomationResult<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)?;
    Ok(())
}
