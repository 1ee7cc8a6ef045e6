//! Bill-of-Quantities domain module.
//!
//! This crate contains the rules for assembling a BOQ from catalog items:
//! snapshotted lines, quantity edits, and totals. Pure domain logic only.

pub mod line;
pub mod line_list;
pub mod total;

pub use line::{Line, parse_quantity};
pub use line_list::{
    AddLine, ClearLines, LineAdded, LineList, LineListCommand, LineListEvent, LineRemoved,
    LinesCleared, QuantityIncremented, QuantitySet, RemoveLine, SetQuantity,
};
pub use total::{compute_total, subtotal};
