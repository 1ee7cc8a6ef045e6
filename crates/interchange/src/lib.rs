//! Catalog import/export.
//!
//! Converts the catalog to and from JSON and CSV text. Parsing never touches
//! application state: importers return the items to install, and the caller
//! replaces the catalog through its reducer.

pub mod csv_codec;
pub mod error;
pub mod format;
pub mod json_codec;

pub use csv_codec::{CSV_HEADER, export_csv, parse_csv};
pub use error::{InterchangeError, InterchangeResult};
pub use format::{ExportFormat, ImportFormat, ImportedCatalog};
pub use json_codec::{export_json, parse_json};
