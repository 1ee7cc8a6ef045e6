use boqkit_boq::{Line, subtotal};

use crate::number::NumberFormat;

pub const TABLE_HEADER: [&str; 4] = ["Item", "Qty", "Unit Price", "Subtotal"];

pub const TABLE_TITLE: &str = "Bill of Quantities";

/// Fixed-layout BOQ table with every cell already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoqTable {
    pub title: String,
    pub rows: Vec<[String; 4]>,
    /// Formatted grand total; the footer label spans the first three columns.
    pub total: String,
}

impl BoqTable {
    pub fn build(lines: &[Line], total: f64, format: &NumberFormat) -> Self {
        let rows = lines
            .iter()
            .map(|line| {
                [
                    line.name.clone(),
                    line.quantity.to_string(),
                    format.format(line.unit_price),
                    format.format(subtotal(line)),
                ]
            })
            .collect();

        Self {
            title: TABLE_TITLE.to_string(),
            rows,
            total: format.format(total),
        }
    }

    pub fn header(&self) -> [&'static str; 4] {
        TABLE_HEADER
    }

    pub fn footer_label(&self) -> &'static str {
        "Total"
    }

    /// Plain-text rendering for terminals: left-aligned names, right-aligned numbers.
    pub fn to_text(&self) -> String {
        let mut widths = TABLE_HEADER.map(str::len);
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        widths[3] = widths[3].max(self.total.chars().count());

        let render = |cells: [&str; 4]| {
            format!(
                "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}",
                cells[0],
                cells[1],
                cells[2],
                cells[3],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
                w3 = widths[3],
            )
        };

        let mut out = Vec::with_capacity(self.rows.len() + 4);
        out.push(render(TABLE_HEADER));
        out.push("-".repeat(widths.iter().sum::<usize>() + 6));
        if self.rows.is_empty() {
            out.push("No items yet.".to_string());
        }
        for row in &self.rows {
            out.push(render([
                row[0].as_str(),
                row[1].as_str(),
                row[2].as_str(),
                row[3].as_str(),
            ]));
        }

        let span = widths[0] + widths[1] + widths[2] + 4;
        out.push(format!(
            "{:>span$}  {:>w3$}",
            self.footer_label(),
            self.total,
            w3 = widths[3],
        ));

        out.join("\n")
    }
}
