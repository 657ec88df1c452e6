#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Sheet name with `(cell, value)` pairs. Numeric values are stored as numbers.
pub type MockSheet<'a> = (&'a str, &'a [(&'a str, &'a str)]);

/// Sheets used by the baseline report
pub const REPORT_SHEETS: [&str; 4] =
    ["Introduction", "Review", "Baseline content", "Change tracking"];

// Helper to create a minimal valid XLSX file for testing
pub fn create_mock_xlsx(
    path: &Path,
    sheets: &[MockSheet],
    defined_names: &[(&str, Option<usize>, &str)],
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    // 1. [Content_Types].xml
    zip.start_file("[Content_Types].xml", options)?;
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
"#,
    );
    for (i, _) in sheets.iter().enumerate() {
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i + 1
        ));
    }
    content_types.push_str("</Types>");
    zip.write_all(content_types.as_bytes())?;

    // 2. _rels/.rels
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#.as_bytes())?;

    // 3. docProps/core.xml
    zip.start_file("docProps/core.xml", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Baseline</dc:title></cp:coreProperties>"#.as_bytes())?;

    // 4. xl/workbook.xml
    zip.start_file("xl/workbook.xml", options)?;
    let mut workbook_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<bookViews><workbookView activeTab="0"/></bookViews>
<sheets>
"#,
    );
    for (i, (name, _)) in sheets.iter().enumerate() {
        workbook_xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            name,
            i + 1,
            i + 1
        ));
    }
    workbook_xml.push_str("</sheets>");

    if !defined_names.is_empty() {
        workbook_xml.push_str("<definedNames>");
        for (name, local_sheet_id, content) in defined_names {
            match local_sheet_id {
                Some(id) => workbook_xml.push_str(&format!(
                    r#"<definedName name="{}" localSheetId="{}">{}</definedName>"#,
                    name, id, content
                )),
                None => workbook_xml.push_str(&format!(
                    r#"<definedName name="{}">{}</definedName>"#,
                    name, content
                )),
            }
        }
        workbook_xml.push_str("</definedNames>");
    }

    workbook_xml.push_str("</workbook>");
    zip.write_all(workbook_xml.as_bytes())?;

    // 5. xl/_rels/workbook.xml.rels
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    let mut rels_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for (i, _) in sheets.iter().enumerate() {
        rels_xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i + 1, i + 1
        ));
    }
    rels_xml.push_str("</Relationships>");
    zip.write_all(rels_xml.as_bytes())?;

    // 6. sheets
    for (i, (_, cells)) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        let mut sheet_xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (cell_ref, value) in cells.iter() {
            let row: String = cell_ref.chars().filter(|c| c.is_ascii_digit()).collect();
            if value.parse::<f64>().is_ok() {
                sheet_xml.push_str(&format!(
                    r#"<row r="{}"><c r="{}"><v>{}</v></c></row>"#,
                    row, cell_ref, value
                ));
            } else {
                sheet_xml.push_str(&format!(
                    r#"<row r="{}"><c r="{}" t="inlineStr"><is><t>{}</t></is></c></row>"#,
                    row, cell_ref, value
                ));
            }
        }
        sheet_xml.push_str("</sheetData></worksheet>");
        zip.write_all(sheet_xml.as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}

/// Report workbook with the identity cells filled in
pub fn create_report_workbook(path: &Path, doc_id: &str, doc_rev: &str) -> anyhow::Result<()> {
    let identity = [("C5", doc_id), ("C6", doc_rev)];
    let empty: &[(&str, &str)] = &[];
    let mut sheets: Vec<MockSheet> = vec![(REPORT_SHEETS[0], &identity[..])];
    for name in &REPORT_SHEETS[1..] {
        sheets.push((*name, empty));
    }
    sheets.push(("Scratch", empty));
    create_mock_xlsx(path, &sheets, &[])
}

pub fn read_zip_entry(path: &Path, name: &str) -> anyhow::Result<String> {
    let file = File::open(path)?;
    let mut zip = zip::ZipArchive::new(file)?;
    let mut entry = zip.by_name(name)?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}
