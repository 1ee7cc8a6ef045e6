use std::collections::HashSet;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use boqkit_catalog::{Catalog, Item, Props};
use boqkit_core::ItemId;

use crate::error::{InterchangeError, InterchangeResult};

const FORMAT: &str = "CSV";

/// Column order of exported files.
pub const CSV_HEADER: [&str; 6] = ["id", "name", "price", "brand", "tags", "props"];

const TAG_SEPARATOR: &str = "|";

/// One row per item; tags joined with `|`, props embedded as a JSON object.
pub fn export_csv(catalog: &Catalog) -> InterchangeResult<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| InterchangeError::encode(FORMAT, e))?;

    for item in catalog.items() {
        let props = serde_json::to_string(&item.props).map_err(|e| InterchangeError::encode(FORMAT, e))?;
        let tags = item.tags.join(TAG_SEPARATOR);
        writer
            .write_record([
                item.id.as_str(),
                item.name.as_str(),
                item.price.to_string().as_str(),
                item.brand.as_deref().unwrap_or(""),
                tags.as_str(),
                props.as_str(),
            ])
            .map_err(|e| InterchangeError::encode(FORMAT, e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| InterchangeError::encode(FORMAT, e))?;
    String::from_utf8(bytes).map_err(|e| InterchangeError::encode(FORMAT, e))
}

/// Header positions resolved once per file.
struct Columns {
    id: Option<usize>,
    name: usize,
    price: Option<usize>,
    brand: Option<usize>,
    tags: Option<usize>,
    props: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> InterchangeResult<Self> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };

        let name = find("name")
            .ok_or_else(|| InterchangeError::format(FORMAT, "header has no 'name' column"))?;

        Ok(Self {
            id: find("id"),
            name,
            price: find("price"),
            brand: find("brand"),
            tags: find("tags"),
            props: find("props"),
        })
    }
}

/// Cell text exactly as written; absent columns read as empty.
fn cell(record: &StringRecord, column: Option<usize>) -> &str {
    column.and_then(|c| record.get(c)).unwrap_or("")
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Derive an item from one CSV row, or say why the row is dropped.
fn row_to_item(record: &StringRecord, columns: &Columns) -> Result<Item, String> {
    let name = cell(record, Some(columns.name));
    if is_blank(name) {
        return Err("blank name".to_string());
    }

    let raw_price = cell(record, columns.price).trim();
    let price = if raw_price.is_empty() {
        0.0
    } else {
        raw_price
            .parse::<f64>()
            .map_err(|_| format!("price '{raw_price}' is not a number"))?
    };

    let raw_props = cell(record, columns.props);
    let props = if is_blank(raw_props) {
        Props::new()
    } else {
        serde_json::from_str::<Props>(raw_props).map_err(|e| format!("malformed props: {e}"))?
    };

    let raw_id = cell(record, columns.id);
    let id = if is_blank(raw_id) {
        ItemId::generate()
    } else {
        ItemId::new(raw_id)
    };

    let raw_tags = cell(record, columns.tags);
    let tags = if is_blank(raw_tags) {
        Vec::new()
    } else {
        raw_tags.split(TAG_SEPARATOR).map(str::to_string).collect()
    };

    let brand = Some(cell(record, columns.brand))
        .filter(|b| !is_blank(b))
        .map(str::to_string);

    let item = Item {
        id,
        name: name.to_string(),
        price,
        brand,
        tags,
        props,
    };
    item.validate().map_err(|e| e.to_string())?;
    Ok(item)
}

/// Parse header-based CSV into items.
///
/// Rows that fail validation are dropped, not fatal: blank name, non-numeric
/// or negative price, malformed `props`, or an id already taken by an earlier
/// row. Returns the surviving items and the number of dropped rows.
pub fn parse_csv(text: &str) -> InterchangeResult<(Vec<Item>, usize)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| InterchangeError::format(FORMAT, e))?
        .clone();
    let columns = Columns::resolve(&headers)?;

    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut dropped = 0;

    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| InterchangeError::format(FORMAT, e))?;
        // +2: one for the header, one for 1-based numbering.
        let row = idx + 2;

        match row_to_item(&record, &columns) {
            Ok(item) if seen.insert(item.id.clone()) => items.push(item),
            Ok(item) => {
                tracing::debug!(row, id = %item.id, "dropping CSV row: duplicate id");
                dropped += 1;
            }
            Err(reason) => {
                tracing::debug!(row, %reason, "dropping CSV row");
                dropped += 1;
            }
        }
    }

    Ok((items, dropped))
}
