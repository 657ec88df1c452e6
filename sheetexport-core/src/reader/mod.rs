//! Workbook reading: sheet list from `xl/workbook.xml`, cell values through calamine

use crate::automation::CellValue;
use crate::error::{AutomationError, AutomationResult};
use crate::reference::CellRef;
use calamine::{Data, ExcelDateTime, Reader, Xlsx, open_workbook};
use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

/// Visibility state of a sheet as stored in the workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetState {
    Visible,
    Hidden,
    VeryHidden,
}

/// A `<sheet>` entry of `xl/workbook.xml`, in tab order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub state: SheetState,
}

/// True for the macro-free and macro-enabled Office Open XML workbooks
pub fn is_workbook_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("xlsx") || s.eq_ignore_ascii_case("xlsm"))
        .unwrap_or(false)
}

/// Read the sheet list of an xlsx/xlsm package
pub fn read_sheet_entries(path: &Path) -> AutomationResult<Vec<SheetEntry>> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut workbook_xml = String::new();
    archive
        .by_name("xl/workbook.xml")?
        .read_to_string(&mut workbook_xml)?;
    parse_sheet_entries(&workbook_xml)
}

pub(crate) fn parse_sheet_entries(workbook_xml: &str) -> AutomationResult<Vec<SheetEntry>> {
    let mut reader = XmlReader::from_str(workbook_xml);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut entry = SheetEntry {
                    name: String::new(),
                    sheet_id: 0,
                    state: SheetState::Visible,
                };

                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"name" => entry.name = attr.unescape_value()?.into_owned(),
                        b"sheetId" => {
                            let value = attr.unescape_value()?;
                            entry.sheet_id = value.parse().map_err(|_| {
                                AutomationError::InvalidReference(format!("sheetId {}", value))
                            })?;
                        }
                        b"state" => {
                            entry.state = match attr.value.as_ref() {
                                b"hidden" => SheetState::Hidden,
                                b"veryHidden" => SheetState::VeryHidden,
                                _ => SheetState::Visible,
                            };
                        }
                        _ => {}
                    }
                }

                sheets.push(entry);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

/// Read a single cell value from a worksheet
pub fn read_cell(path: &Path, sheet: &str, cell: CellRef) -> AutomationResult<CellValue> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(sheet)?;

    Ok(range
        .get_value((cell.row, cell.col))
        .map(to_cell_value)
        .unwrap_or(CellValue::Empty))
}

/// Check that calamine accepts the package as a workbook
pub fn validate_workbook(path: &Path) -> AutomationResult<()> {
    let workbook: Xlsx<_> = open_workbook(path)?;
    if workbook.sheet_names().is_empty() {
        return Err(AutomationError::Other(anyhow::anyhow!(
            "Workbook has no sheets: {}",
            path.display()
        )));
    }
    Ok(())
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => datetime_value(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// Dates render as `YYYY-MM-DD`, with the time appended when it is not midnight.
/// Durations stay numeric.
fn datetime_value(dt: &ExcelDateTime) -> CellValue {
    if dt.is_duration() {
        return CellValue::Number(dt.as_f64());
    }
    let pattern = if dt.as_f64().fract() == 0.0 {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%d %H:%M:%S"
    };
    match dt.as_datetime() {
        Some(value) => CellValue::Text(value.format(pattern).to_string()),
        None => CellValue::Number(dt.as_f64()),
    }
}
