//! Catalog domain module.
//!
//! This crate contains the business rules for the item catalog: the item
//! record and its validation, the catalog reducer, and the search view. All of
//! it is deterministic domain logic (no IO, no formatting, no storage).

pub mod catalog;
pub mod filter;
pub mod item;
pub mod sample;

pub use catalog::{
    AddItem, Catalog, CatalogCommand, CatalogEvent, CatalogReplaced, DeleteItem, ItemAdded,
    ItemDeleted, ItemUpdated, ReplaceCatalog, UpdateItem, validate_items,
};
pub use filter::CatalogFilter;
pub use item::{Item, ItemDraft, Props, parse_price, parse_tag_list, serialize_amount};
pub use sample::sample_catalog;
