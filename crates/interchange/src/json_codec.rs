use serde_json::Value;

use boqkit_catalog::{Catalog, Item};

use crate::error::{InterchangeError, InterchangeResult};

const FORMAT: &str = "JSON";

/// Pretty-printed JSON array of the catalog's items.
pub fn export_json(catalog: &Catalog) -> InterchangeResult<String> {
    serde_json::to_string_pretty(catalog.items()).map_err(|e| InterchangeError::encode(FORMAT, e))
}

/// Parse a JSON array of items.
///
/// The root must be an array and every element an item record. Field
/// validation (blank names, negative prices, duplicate ids) is left to the
/// catalog reducer.
pub fn parse_json(text: &str) -> InterchangeResult<Vec<Item>> {
    // Decode straight into items so `props` keep their document order.
    serde_json::from_str::<Vec<Item>>(text).map_err(|err| {
        match serde_json::from_str::<Value>(text) {
            Ok(root) if !root.is_array() => InterchangeError::format(FORMAT, "root is not an array"),
            _ => InterchangeError::format(FORMAT, err),
        }
    })
}
