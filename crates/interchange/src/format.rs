//! File-type dispatch for the import/export surface.

use std::path::Path;

use boqkit_catalog::{Catalog, Item};

use crate::csv_codec::{export_csv, parse_csv};
use crate::error::{InterchangeError, InterchangeResult};
use crate::json_codec::{export_json, parse_json};

/// Importable catalog formats, chosen by file extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

/// Items parsed from an import file, ready to replace the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedCatalog {
    pub format: ImportFormat,
    pub items: Vec<Item>,
    /// CSV rows skipped for failing validation (always 0 for JSON).
    pub dropped_rows: usize,
}

impl ImportFormat {
    /// `.json` or `.csv` (case-insensitive); anything else is unsupported.
    pub fn from_path(path: &Path) -> InterchangeResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(ImportFormat::Json),
            Some("csv") => Ok(ImportFormat::Csv),
            _ => Err(InterchangeError::UnsupportedFormat(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            )),
        }
    }

    pub fn parse(self, text: &str) -> InterchangeResult<ImportedCatalog> {
        let (items, dropped_rows) = match self {
            ImportFormat::Json => (parse_json(text)?, 0),
            ImportFormat::Csv => parse_csv(text)?,
        };

        Ok(ImportedCatalog {
            format: self,
            items,
            dropped_rows,
        })
    }
}

/// Catalog export artifacts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Default download name.
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "items.json",
            ExportFormat::Csv => "items.csv",
        }
    }

    pub fn render(self, catalog: &Catalog) -> InterchangeResult<String> {
        match self {
            ExportFormat::Json => export_json(catalog),
            ExportFormat::Csv => export_csv(catalog),
        }
    }
}
