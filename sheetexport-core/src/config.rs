//! Configuration for the export workflow

use crate::automation::ExportQuality;
use crate::reference::{CellRef, RowRange};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Export configuration, loaded from `sheetexport.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Sheet holding the document identity cells, reselected during cleanup
    pub identity_sheet: String,
    pub doc_id_cell: String,
    pub doc_rev_cell: String,
    /// Last word of the report filename: `<id> rev <rev> <suffix>.pdf`
    pub report_suffix: String,
    /// Sheets exported to the report, in selection order
    pub export_sheets: Vec<String>,
    /// Repeating header rows applied before export
    pub print_titles: Vec<PrintTitles>,
    pub quality: ExportQuality,
    /// Office binary used by the production adapter (defaults to a PATH lookup)
    pub office_binary: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintTitles {
    pub sheet: String,
    pub rows: String,
}

impl PrintTitles {
    pub fn new(sheet: &str, rows: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            rows: rows.to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            identity_sheet: "Introduction".to_string(),
            doc_id_cell: "C5".to_string(),
            doc_rev_cell: "C6".to_string(),
            report_suffix: "BaselineReport".to_string(),
            export_sheets: vec![
                "Introduction".to_string(),
                "Review".to_string(),
                "Baseline content".to_string(),
                "Change tracking".to_string(),
            ],
            print_titles: vec![
                PrintTitles::new("Baseline content", "$2:$4"),
                PrintTitles::new("Review", "$24:$25"),
            ],
            quality: ExportQuality::Standard,
            office_binary: None,
        }
    }
}

impl ExportConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ExportConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate references and sheet lists
    pub fn validate(&self) -> Result<()> {
        if self.identity_sheet.trim().is_empty() {
            anyhow::bail!("Configuration error: identity_sheet must not be empty");
        }
        self.doc_id_cell()
            .context("Configuration error: invalid doc_id_cell")?;
        self.doc_rev_cell()
            .context("Configuration error: invalid doc_rev_cell")?;

        if self.report_suffix.trim().is_empty() {
            anyhow::bail!("Configuration error: report_suffix must not be empty");
        }

        if self.export_sheets.is_empty() {
            anyhow::bail!("Configuration error: export_sheets must name at least one sheet");
        }
        let mut seen = HashSet::new();
        for sheet in &self.export_sheets {
            if !seen.insert(sheet.as_str()) {
                anyhow::bail!(
                    "Configuration error: sheet '{}' is listed twice in export_sheets",
                    sheet
                );
            }
        }

        for titles in &self.print_titles {
            titles.rows.parse::<RowRange>().with_context(|| {
                format!(
                    "Configuration error: invalid print title rows for sheet '{}'",
                    titles.sheet
                )
            })?;
        }

        Ok(())
    }

    pub fn doc_id_cell(&self) -> Result<CellRef> {
        Ok(self.doc_id_cell.parse::<CellRef>()?)
    }

    pub fn doc_rev_cell(&self) -> Result<CellRef> {
        Ok(self.doc_rev_cell.parse::<CellRef>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.identity_sheet, "Introduction");
        assert_eq!(config.doc_id_cell().unwrap(), CellRef::new(4, 2));
        assert_eq!(config.doc_rev_cell().unwrap(), CellRef::new(5, 2));
        assert_eq!(
            config.export_sheets,
            ["Introduction", "Review", "Baseline content", "Change tracking"]
        );
        assert_eq!(config.print_titles[0], PrintTitles::new("Baseline content", "$2:$4"));
        assert_eq!(config.print_titles[1], PrintTitles::new("Review", "$24:$25"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ExportConfig = toml::from_str(
            r#"
report_suffix = "Summary"
quality = "minimum"

[[print_titles]]
sheet = "Review"
rows = "$1:$2"
"#,
        )
        .unwrap();

        assert_eq!(config.report_suffix, "Summary");
        assert_eq!(config.quality, ExportQuality::Minimum);
        assert_eq!(config.doc_id_cell, "C5");
        assert_eq!(config.export_sheets.len(), 4);
        assert_eq!(config.print_titles, vec![PrintTitles::new("Review", "$1:$2")]);
    }

    #[test]
    fn test_validation() {
        let config = ExportConfig::default();

        let mut bad_config = config.clone();
        bad_config.doc_id_cell = "5C".to_string();
        assert!(bad_config.validate().is_err());

        let mut bad_config = config.clone();
        bad_config.export_sheets.clear();
        assert!(bad_config.validate().is_err());

        let mut bad_config = config.clone();
        bad_config.export_sheets.push("Review".to_string());
        assert!(bad_config.validate().is_err());

        let mut bad_config = config.clone();
        bad_config.print_titles.push(PrintTitles::new("Review", "$9:$3"));
        assert!(bad_config.validate().is_err());

        let mut bad_config = config;
        bad_config.report_suffix = " ".to_string();
        assert!(bad_config.validate().is_err());
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sheetexport.toml");
        fs::write(&path, "identity_sheet = \"Cover\"\ndoc_id_cell = \"B2\"\n")?;

        let config = ExportConfig::from_file(&path)?;
        assert_eq!(config.identity_sheet, "Cover");
        assert_eq!(config.doc_id_cell()?, CellRef::new(1, 1));
        assert_eq!(config.doc_rev_cell, "C6");

        fs::write(&path, "export_sheets = \"not a list\"\n")?;
        assert!(ExportConfig::from_file(&path).is_err());
        Ok(())
    }
}
