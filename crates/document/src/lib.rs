//! BOQ document export.
//!
//! A pure formatting transform: lines and their total go in, a table model or
//! PDF bytes come out. Nothing is retained between calls.

pub mod number;
pub mod pdf;
pub mod table;

pub use number::NumberFormat;
pub use pdf::{BOQ_PDF_FILE_NAME, DocumentError, render_table_pdf};
pub use table::{BoqTable, TABLE_HEADER};
