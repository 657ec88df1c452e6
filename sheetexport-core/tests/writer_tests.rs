mod common;

use common::{create_mock_xlsx, read_zip_entry};
use sheetexport_core::RowRange;
use sheetexport_core::writer::{WorkbookEdits, apply_workbook_edits};
use std::fs::File;

fn titles(sheet: &str, first: u32, last: u32) -> WorkbookEdits {
    let mut edits = WorkbookEdits::default();
    edits
        .print_titles
        .insert(sheet.to_string(), RowRange::new(first, last).unwrap());
    edits
}

#[test]
fn test_print_titles_added() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("input.xlsx");
    let output_path = dir.path().join("output.xlsx");

    create_mock_xlsx(
        &input_path,
        &[("Introduction", &[]), ("Baseline content", &[])],
        &[],
    )?;

    apply_workbook_edits(&input_path, &output_path, &titles("Baseline content", 2, 4))?;

    let content = read_zip_entry(&output_path, "xl/workbook.xml")?;
    assert!(content.contains(r#"<definedName name="_xlnm.Print_Titles" localSheetId="1">"#));
    assert!(content.contains("Baseline content"));
    assert!(content.contains("!$2:$4</definedName>"));

    // Sheets are copied untouched
    let file = File::open(&output_path)?;
    let mut zip = zip::ZipArchive::new(file)?;
    assert!(zip.by_name("xl/worksheets/sheet1.xml").is_ok());
    assert!(zip.by_name("xl/worksheets/sheet2.xml").is_ok());

    Ok(())
}

#[test]
fn test_existing_print_titles_replaced() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("input_titles.xlsx");
    let output_path = dir.path().join("output_titles.xlsx");

    create_mock_xlsx(
        &input_path,
        &[("Introduction", &[]), ("Review", &[])],
        &[
            ("_xlnm.Print_Titles", Some(1), "Review!$1:$1"),
            ("_xlnm.Print_Titles", Some(0), "Introduction!$3:$3"),
            ("KeepRange", None, "Review!$A$1"),
        ],
    )?;

    apply_workbook_edits(&input_path, &output_path, &titles("Review", 24, 25))?;

    let content = read_zip_entry(&output_path, "xl/workbook.xml")?;
    assert!(!content.contains("Review!$1:$1"), "old Review titles remain");
    assert!(content.contains("!$24:$25"));
    assert!(content.contains("Introduction!$3:$3"), "other sheet titles kept");
    assert!(content.contains(r#"name="KeepRange""#));
    assert_eq!(content.matches("<definedNames>").count(), 1);

    Ok(())
}

#[test]
fn test_selection_and_print_area_clearing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("input_selection.xlsx");
    let output_path = dir.path().join("output_selection.xlsx");

    create_mock_xlsx(
        &input_path,
        &[("Scratch", &[]), ("Introduction", &[]), ("Review", &[])],
        &[("_xlnm.Print_Area", Some(2), "Review!$A$1:$H$40")],
    )?;

    let edits = WorkbookEdits {
        selected_sheets: Some(vec!["Introduction".to_string(), "Review".to_string()]),
        clear_print_areas: true,
        ..Default::default()
    };
    apply_workbook_edits(&input_path, &output_path, &edits)?;

    let content = read_zip_entry(&output_path, "xl/workbook.xml")?;
    assert!(content.contains(r#"<sheet name="Scratch" sheetId="1" r:id="rId1" state="hidden"/>"#));
    assert!(content.contains(r#"<sheet name="Review" sheetId="3" r:id="rId3"/>"#));
    assert!(content.contains(r#"activeTab="1""#));
    assert!(!content.contains("_xlnm.Print_Area"));

    Ok(())
}

#[test]
fn test_doc_properties_stripped() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("input_props.xlsx");
    let output_path = dir.path().join("output_props.xlsx");

    create_mock_xlsx(&input_path, &[("Introduction", &[])], &[])?;

    let edits = WorkbookEdits {
        strip_doc_properties: true,
        ..Default::default()
    };
    apply_workbook_edits(&input_path, &output_path, &edits)?;

    let file = File::open(&output_path)?;
    let mut zip = zip::ZipArchive::new(file)?;
    assert!(zip.by_name("docProps/core.xml").is_err());
    drop(zip);

    let rels = read_zip_entry(&output_path, "_rels/.rels")?;
    assert!(!rels.contains("docProps/"));
    assert!(rels.contains("xl/workbook.xml"));

    let content_types = read_zip_entry(&output_path, "[Content_Types].xml")?;
    assert!(!content_types.contains("/docProps/"));
    assert!(content_types.contains("/xl/workbook.xml"));

    Ok(())
}

#[test]
fn test_unknown_sheet_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("input_unknown.xlsx");
    let output_path = dir.path().join("output_unknown.xlsx");

    create_mock_xlsx(&input_path, &[("Introduction", &[])], &[])?;

    let result = apply_workbook_edits(&input_path, &output_path, &titles("Review", 24, 25));
    assert!(result.is_err());

    Ok(())
}
