use serde::{Deserialize, Serialize};

use boqkit_catalog::{Item, serialize_amount};
use boqkit_core::{DomainError, DomainResult, Entity, ItemId};

fn default_quantity() -> u64 {
    1
}

/// BOQ line: an item snapshot and a quantity.
///
/// `name` and `unit_price` are copied from the catalog item when the line is
/// created and are never refreshed; the line outlives the item if it is
/// deleted from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub item_id: ItemId,
    pub name: String,
    #[serde(serialize_with = "serialize_amount")]
    pub unit_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u64,
}

impl Line {
    /// A fresh line (quantity 1) snapshotting `item`.
    pub fn snapshot(item: &Item) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity: 1,
        }
    }
}

impl Entity for Line {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.item_id
    }
}

/// Parse user-entered quantity text.
///
/// Only non-numeric text is an error here; range handling (clamping negatives,
/// dropping fractions) happens in the reducer.
pub fn parse_quantity(raw: &str) -> DomainResult<f64> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(qty) if qty.is_finite() => Ok(qty),
        _ => Err(DomainError::validation(format!(
            "quantity '{trimmed}' is not a number"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_copies_name_and_price() {
        let item = Item::new("1", "Cement", 500.0).with_tags(["material"]);
        let line = Line::snapshot(&item);
        assert_eq!(line.item_id, ItemId::new("1"));
        assert_eq!(line.name, "Cement");
        assert_eq!(line.unit_price, 500.0);
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn json_uses_camel_case_field_names() {
        let line = Line::snapshot(&Item::new("1", "Cement", 500.0));
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(
            json,
            r#"{"itemId":"1","name":"Cement","unitPrice":500,"quantity":1}"#
        );
    }

    #[test]
    fn missing_quantity_defaults_to_one() {
        let line: Line =
            serde_json::from_str(r#"{"itemId":"1","name":"Cement","unitPrice":500}"#).unwrap();
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn parse_quantity_rejects_non_numeric() {
        assert_eq!(parse_quantity(" 3 ").unwrap(), 3.0);
        assert_eq!(parse_quantity("-2").unwrap(), -2.0);
        assert!(matches!(parse_quantity("lots"), Err(DomainError::Validation(_))));
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("inf").is_err());
    }
}
