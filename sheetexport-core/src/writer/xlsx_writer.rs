//! XLSX writer: print titles, sheet selection and document properties

use super::print_titles_reference;
use crate::reader::{SheetEntry, SheetState, parse_sheet_entries};
use crate::reference::RowRange;
use anyhow::Result;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const PRINT_TITLES: &str = "_xlnm.Print_Titles";
const PRINT_AREA: &str = "_xlnm.Print_Area";

/// Elements that precede `<definedNames>` in a workbook part
const DEFINED_NAMES_PREDECESSORS: [&[u8]; 3] =
    [b"sheets", b"functionGroups", b"externalReferences"];

/// Changes applied to a workbook copy
#[derive(Debug, Default, Clone)]
pub struct WorkbookEdits {
    /// Repeating header rows per sheet name
    pub print_titles: BTreeMap<String, RowRange>,
    /// Sheets to keep visible, first one becomes the active tab. Others are hidden.
    pub selected_sheets: Option<Vec<String>>,
    /// Drop `_xlnm.Print_Area` names so whole sheets are rendered
    pub clear_print_areas: bool,
    /// Drop the `docProps/` parts
    pub strip_doc_properties: bool,
}

impl WorkbookEdits {
    /// The subset of edits that belongs in a saved workbook
    pub fn persistent(&self) -> Self {
        Self {
            print_titles: self.print_titles.clone(),
            ..Default::default()
        }
    }
}

/// Apply edits to an XLSX/XLSM package, copying every untouched part as is
pub fn apply_workbook_edits_xlsx(
    input_path: &Path,
    output_path: &Path,
    edits: &WorkbookEdits,
) -> Result<()> {
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader)?;

    let workbook_xml = read_file_from_zip(&mut archive, "xl/workbook.xml")?;
    let sheets = parse_sheet_entries(&workbook_xml)?;
    check_sheet_names(&sheets, edits)?;

    let output_file = File::create(output_path)?;
    let mut zip_writer = ZipWriter::new(output_file);

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();

        if edits.strip_doc_properties && name.starts_with("docProps/") {
            continue;
        }

        let content = if name == "xl/workbook.xml" {
            Some(rewrite_workbook_xml(&workbook_xml, &sheets, edits)?)
        } else if edits.strip_doc_properties && name == "_rels/.rels" {
            let mut content = String::new();
            file.read_to_string(&mut content)?;
            Some(remove_doc_property_relationships(&content)?)
        } else if edits.strip_doc_properties && name == "[Content_Types].xml" {
            let mut content = String::new();
            file.read_to_string(&mut content)?;
            Some(remove_doc_property_content_types(&content)?)
        } else {
            None
        };

        zip_writer.start_file(name.as_str(), SimpleFileOptions::default())?;
        match content {
            Some(content) => zip_writer.write_all(content.as_bytes())?,
            None => {
                let mut buffer = Vec::new();
                file.read_to_end(&mut buffer)?;
                zip_writer.write_all(&buffer)?;
            }
        }
    }

    zip_writer.finish()?;
    Ok(())
}

// Helper functions

fn read_file_from_zip(archive: &mut ZipArchive<BufReader<File>>, filename: &str) -> Result<String> {
    let mut file = archive.by_name(filename)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

fn check_sheet_names(sheets: &[SheetEntry], edits: &WorkbookEdits) -> Result<()> {
    let known: HashSet<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    let requested = edits
        .print_titles
        .keys()
        .chain(edits.selected_sheets.iter().flatten());

    for name in requested {
        if !known.contains(name.as_str()) {
            anyhow::bail!("Sheet not found: {}", name);
        }
    }
    if edits.selected_sheets.as_ref().is_some_and(|s| s.is_empty()) {
        anyhow::bail!("Sheet selection must not be empty");
    }
    Ok(())
}

/// Find where `<definedNames>` goes when the workbook has none
fn scan_defined_names_anchor(xml: &str) -> Result<(bool, Option<Vec<u8>>)> {
    let mut reader = Reader::from_str(xml);
    let mut has_defined_names = false;
    let mut anchor = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"definedNames" => {
                has_defined_names = true;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"definedNames" => {
                has_defined_names = true;
            }
            Event::End(e) if DEFINED_NAMES_PREDECESSORS.contains(&e.local_name().as_ref()) => {
                anchor = Some(e.local_name().as_ref().to_vec());
            }
            Event::Empty(e) if DEFINED_NAMES_PREDECESSORS.contains(&e.local_name().as_ref()) => {
                anchor = Some(e.local_name().as_ref().to_vec());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((has_defined_names, anchor))
}

fn rewrite_workbook_xml(xml: &str, sheets: &[SheetEntry], edits: &WorkbookEdits) -> Result<String> {
    let (has_defined_names, anchor) = scan_defined_names_anchor(xml)?;

    let index_of = |name: &str| sheets.iter().position(|s| s.name == name);
    let replaced_titles: HashSet<usize> = edits
        .print_titles
        .keys()
        .filter_map(|name| index_of(name.as_str()))
        .collect();

    // New print titles in tab order
    let mut new_titles: Vec<(usize, String)> = edits
        .print_titles
        .iter()
        .filter_map(|(name, rows)| {
            index_of(name.as_str()).map(|idx| (idx, print_titles_reference(name, rows)))
        })
        .collect();
    new_titles.sort_by_key(|(idx, _)| *idx);

    let selected: Option<HashSet<&str>> = edits
        .selected_sheets
        .as_ref()
        .map(|names| names.iter().map(String::as_str).collect());
    let active_tab = edits
        .selected_sheets
        .as_ref()
        .and_then(|names| names.first())
        .and_then(|name| index_of(name.as_str()));

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();
    let mut prefix = String::new();
    let mut skip_current_name = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"workbook" => {
                prefix = element_prefix(&e);
                writer.write_event(Event::Start(e))?;
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                writer.write_event(Event::Empty(edit_sheet(e, selected.as_ref())?))?;
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                writer.write_event(Event::Start(edit_sheet(e, selected.as_ref())?))?;
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"workbookView" => {
                let e = match active_tab {
                    Some(tab) => with_attribute(&e, "activeTab", &tab.to_string())?,
                    None => e.into_owned(),
                };
                writer.write_event(Event::Empty(e))?;
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"definedName" => {
                if drops_defined_name(&e, &replaced_titles, edits)? {
                    skip_current_name = true;
                } else {
                    writer.write_event(Event::Start(e))?;
                }
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"definedName" => {
                if !drops_defined_name(&e, &replaced_titles, edits)? {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"definedName" => {
                if skip_current_name {
                    skip_current_name = false;
                } else {
                    writer.write_event(Event::End(e))?;
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"definedNames" => {
                write_print_titles(&mut writer, &prefix, &new_titles)?;
                writer.write_event(Event::End(e))?;
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"definedNames" => {
                // `<definedNames/>` becomes a populated element
                let name = String::from_utf8(e.name().as_ref().to_vec())?;
                writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
                write_print_titles(&mut writer, &prefix, &new_titles)?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            Ok(Event::End(e))
                if !has_defined_names
                    && anchor.as_deref() == Some(e.local_name().as_ref()) =>
            {
                writer.write_event(Event::End(e))?;
                write_defined_names(&mut writer, &prefix, &new_titles)?;
            }
            Ok(Event::Empty(e))
                if !has_defined_names
                    && anchor.as_deref() == Some(e.local_name().as_ref()) =>
            {
                writer.write_event(Event::Empty(e))?;
                write_defined_names(&mut writer, &prefix, &new_titles)?;
            }
            Ok(Event::Eof) => break,
            Ok(e) => {
                if !skip_current_name {
                    writer.write_event(e)?;
                }
            }
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
        }
        buf.clear();
    }

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}

fn element_prefix(e: &BytesStart) -> String {
    e.name()
        .prefix()
        .map(|p| format!("{}:", String::from_utf8_lossy(p.as_ref())))
        .unwrap_or_default()
}

/// Copy `e` with `key` set to `value`, replacing any previous value
fn with_attribute(e: &BytesStart, key: &str, value: &str) -> Result<BytesStart<'static>> {
    let name = String::from_utf8(e.name().as_ref().to_vec())?;
    let mut out = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != key.as_bytes() {
            out.push_attribute(attr);
        }
    }
    out.push_attribute((key, value));
    Ok(out)
}

fn edit_sheet(e: BytesStart, selected: Option<&HashSet<&str>>) -> Result<BytesStart<'static>> {
    let Some(selected) = selected else {
        return Ok(e.into_owned());
    };

    let mut name = String::new();
    let mut state = SheetState::Visible;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"name" => name = attr.unescape_value()?.into_owned(),
            b"state" if attr.value.as_ref() == b"veryHidden" => state = SheetState::VeryHidden,
            b"state" if attr.value.as_ref() == b"hidden" => state = SheetState::Hidden,
            _ => {}
        }
    }

    if selected.contains(name.as_str()) || state != SheetState::Visible {
        Ok(e.into_owned())
    } else {
        with_attribute(&e, "state", "hidden")
    }
}

fn drops_defined_name(
    e: &BytesStart,
    replaced_titles: &HashSet<usize>,
    edits: &WorkbookEdits,
) -> Result<bool> {
    let mut name = String::new();
    let mut local_sheet_id = None;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"name" => name = attr.unescape_value()?.into_owned(),
            b"localSheetId" => local_sheet_id = attr.unescape_value()?.parse::<usize>().ok(),
            _ => {}
        }
    }

    Ok(match name.as_str() {
        PRINT_TITLES => local_sheet_id.is_some_and(|id| replaced_titles.contains(&id)),
        PRINT_AREA => edits.clear_print_areas,
        _ => false,
    })
}

fn write_print_titles(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    prefix: &str,
    titles: &[(usize, String)],
) -> Result<()> {
    let element = format!("{}definedName", prefix);
    for (sheet_index, reference) in titles {
        let local_sheet_id = sheet_index.to_string();
        let start = BytesStart::new(element.as_str()).with_attributes([
            ("name", PRINT_TITLES),
            ("localSheetId", local_sheet_id.as_str()),
        ]);
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(reference)))?;
        writer.write_event(Event::End(BytesEnd::new(element.as_str())))?;
    }
    Ok(())
}

fn write_defined_names(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    prefix: &str,
    titles: &[(usize, String)],
) -> Result<()> {
    if titles.is_empty() {
        return Ok(());
    }
    let element = format!("{}definedNames", prefix);
    writer.write_event(Event::Start(BytesStart::new(element.as_str())))?;
    write_print_titles(writer, prefix, titles)?;
    writer.write_event(Event::End(BytesEnd::new(element.as_str())))?;
    Ok(())
}

fn remove_doc_property_relationships(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) if e.name().as_ref() == b"Relationship" => {
                let mut target = String::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"Target" {
                        target = String::from_utf8(attr.value.to_vec())?;
                        break;
                    }
                }

                if !target.trim_start_matches('/').starts_with("docProps/") {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(e) => writer.write_event(e)?,
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
        }
        buf.clear();
    }

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}

fn remove_doc_property_content_types(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) if e.name().as_ref() == b"Override" => {
                let mut part_name = String::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"PartName" {
                        part_name = String::from_utf8(attr.value.to_vec())?;
                        break;
                    }
                }

                if !part_name.starts_with("/docProps/") {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(e) => writer.write_event(e)?,
            Err(e) => return Err(anyhow::anyhow!("Error parsing XML: {}", e)),
        }
        buf.clear();
    }

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}
