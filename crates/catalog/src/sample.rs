//! Bundled sample dataset used when no catalog has been persisted yet.

use crate::catalog::Catalog;
use crate::item::Item;

const SAMPLE_ITEMS: &str = include_str!("../data/sample_items.json");

/// The catalog a fresh installation starts with.
pub fn sample_catalog() -> Catalog {
    let parsed = serde_json::from_str::<Vec<Item>>(SAMPLE_ITEMS)
        .map_err(|e| e.to_string())
        .and_then(|items| Catalog::new(items).map_err(|e| e.to_string()));

    match parsed {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(error = %err, "bundled sample catalog is invalid; starting empty");
            Catalog::empty()
        }
    }
}
