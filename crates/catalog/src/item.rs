use core::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use boqkit_core::{DomainError, DomainResult, Entity, ItemId};

/// Free-form item properties: string keys to string values.
///
/// Keys are unique. Insertion order is kept so properties display in the order
/// they were entered, but two maps with the same entries compare equal
/// regardless of order.
#[derive(Debug, Clone, Default)]
pub struct Props(Vec<(String, String)>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. An overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(core::mem::replace(existing, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

impl Serialize for Props {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct PropsVisitor;

impl<'de> Visitor<'de> for PropsVisitor {
    type Value = Props;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of string keys to string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Props, A::Error> {
        let mut props = Props::new();
        while let Some((k, v)) = access.next_entry::<String, String>()? {
            props.insert(k, v);
        }
        Ok(props)
    }
}

impl<'de> Deserialize<'de> for Props {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PropsVisitor)
    }
}

/// Write a money amount, dropping the fraction when it is whole: `500`, not
/// `500.0`. Whole values beyond 2^53 stay floats.
pub fn serialize_amount<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    if amount.fract() == 0.0 && amount.abs() < EXACT_LIMIT {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(serialize_with = "serialize_amount")]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub props: Props,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            brand: None,
            tags: Vec::new(),
            props: Props::new(),
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key, value);
        self
    }

    /// Check the fields an edit must satisfy before it is persisted.
    pub fn validate(&self) -> DomainResult<()> {
        if self.id.is_blank() {
            return Err(DomainError::invalid_id("item id cannot be blank"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("item must have a name"));
        }
        check_price(self.price)
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

fn check_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() {
        return Err(DomainError::validation("price must be a number"));
    }
    if price < 0.0 {
        return Err(DomainError::validation("price cannot be negative"));
    }
    Ok(())
}

/// Parse user-entered price text into a finite, non-negative number.
pub fn parse_price(raw: &str) -> DomainResult<f64> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::validation(format!("price '{}' is not a number", raw.trim())))?;
    check_price(price)?;
    Ok(price)
}

/// Split comma-separated tag text; blanks are dropped.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Form input for creating or editing an item, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub price: String,
    pub brand: String,
    /// Comma-separated.
    pub tags: String,
    pub props: Vec<(String, String)>,
}

impl ItemDraft {
    /// Pre-fill a draft from an existing item (edit form).
    pub fn from_item(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            price: item.price.to_string(),
            brand: item.brand.clone().unwrap_or_default(),
            tags: item.tags.join(", "),
            props: item
                .props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Validate the draft and build an item carrying `id`.
    pub fn into_item(self, id: ItemId) -> DomainResult<Item> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("item must have a name"));
        }
        let price = parse_price(&self.price)?;
        let brand = Some(self.brand.trim().to_string()).filter(|b| !b.is_empty());
        let props = self
            .props
            .into_iter()
            .filter(|(k, _)| !k.trim().is_empty())
            .collect();

        let item = Item {
            id,
            name: self.name,
            price,
            brand,
            tags: parse_tag_list(&self.tags),
            props,
        };
        item.validate()?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_prices_serialize_without_a_fraction() {
        let json = |price: f64| serde_json::to_string(&Item::new("1", "Cement", price)).unwrap();
        assert!(json(500.0).contains(r#""price":500,"#));
        assert!(json(2.5).contains(r#""price":2.5,"#));
        assert!(json(0.0).contains(r#""price":0,"#));
        assert!(json(1e300).contains(r#""price":1e300,"#));

        let back: Item = serde_json::from_str(&json(500.0)).unwrap();
        assert_eq!(back.price, 500.0);
    }

    #[test]
    fn validate_rejects_blank_name() {
        let err = Item::new("1", "  ", 10.0).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_price() {
        assert!(Item::new("1", "Cement", -1.0).validate().is_err());
        assert!(Item::new("1", "Cement", f64::NAN).validate().is_err());
        assert!(Item::new("1", "Cement", f64::INFINITY).validate().is_err());
        assert!(Item::new("1", "Cement", 0.0).validate().is_ok());
    }

    #[test]
    fn parse_price_accepts_decimals_and_rejects_text() {
        assert_eq!(parse_price(" 2.5 ").unwrap(), 2.5);
        assert!(matches!(parse_price("abc"), Err(DomainError::Validation(_))));
        assert!(parse_price("").is_err());
        assert!(parse_price("NaN").is_err());
    }

    #[test]
    fn parse_tag_list_trims_and_drops_blanks() {
        assert_eq!(parse_tag_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_tag_list("").is_empty());
    }

    #[test]
    fn props_insert_overwrites_in_place() {
        let mut props = Props::new();
        props.insert("unit", "bag");
        props.insert("grade", "42.5R");
        assert_eq!(props.insert("unit", "tonne"), Some("bag".to_string()));

        let keys: Vec<_> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["unit", "grade"]);
        assert_eq!(props.get("unit"), Some("tonne"));
    }

    #[test]
    fn props_equality_ignores_order() {
        let a: Props = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: Props = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn props_serialize_in_insertion_order() {
        let props: Props = [("z", "last"), ("a", "first")].into_iter().collect();
        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"z":"last","a":"first"}"#);

        let back: Props = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = back.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn props_reject_non_string_values() {
        assert!(serde_json::from_str::<Props>(r#"{"n": 1}"#).is_err());
        assert!(serde_json::from_str::<Props>("[]").is_err());
    }

    #[test]
    fn item_json_omits_absent_brand_and_defaults_collections() {
        let item = Item::new("1", "Cement", 500.0);
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("brand"));

        let parsed: Item = serde_json::from_str(r#"{"id":"9","name":"Nail","price":1}"#).unwrap();
        assert!(parsed.tags.is_empty());
        assert!(parsed.props.is_empty());
        assert_eq!(parsed.price, 1.0);
    }

    #[test]
    fn draft_builds_validated_item() {
        let draft = ItemDraft {
            name: "Bolt".to_string(),
            price: "2.5".to_string(),
            brand: "  ".to_string(),
            tags: "hardware, steel".to_string(),
            props: vec![
                ("thread".to_string(), "M12".to_string()),
                ("".to_string(), "ignored".to_string()),
            ],
        };

        let item = draft.into_item(ItemId::new("b1")).unwrap();
        assert_eq!(item.price, 2.5);
        assert_eq!(item.brand, None);
        assert_eq!(item.tags, vec!["hardware", "steel"]);
        assert_eq!(item.props.len(), 1);
    }

    #[test]
    fn draft_rejects_missing_name_or_bad_price() {
        let no_name = ItemDraft {
            price: "1".to_string(),
            ..ItemDraft::default()
        };
        assert!(matches!(
            no_name.into_item(ItemId::new("x")),
            Err(DomainError::Validation(_))
        ));

        let bad_price = ItemDraft {
            name: "Nail".to_string(),
            price: "cheap".to_string(),
            ..ItemDraft::default()
        };
        assert!(bad_price.into_item(ItemId::new("x")).is_err());
    }

    #[test]
    fn draft_round_trips_an_existing_item() {
        let item = Item::new("4", "Rebar", 9500.0)
            .with_brand("ACME Steel")
            .with_tags(["material", "steel"])
            .with_prop("grade", "B500");

        let rebuilt = ItemDraft::from_item(&item).into_item(item.id.clone()).unwrap();
        assert_eq!(rebuilt, item);
    }
}
