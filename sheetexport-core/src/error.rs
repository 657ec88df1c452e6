//! Errors raised by the automation layer

use std::path::PathBuf;
use thiserror::Error;

pub type AutomationResult<T> = Result<T, AutomationError>;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid workbook package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("Unsupported workbook format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Cell {cell} on sheet '{sheet}' is empty")]
    EmptyCell { sheet: String, cell: String },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("No workbook is open")]
    NoWorkbookOpen,

    #[error("A workbook is already open: {}", .0.display())]
    AlreadyOpen(PathBuf),

    #[error("Automation session has already quit")]
    SessionClosed,

    #[error("Office application not found: {0}")]
    OfficeNotFound(String),

    #[error("PDF conversion failed: {0}")]
    ConversionFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
