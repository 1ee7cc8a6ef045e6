//! PDF rendering of the BOQ table.

use lopdf::{Document, Object, Stream, dictionary};
use thiserror::Error;

use crate::table::BoqTable;
#[cfg(test)]
use crate::number::NumberFormat;

pub const BOQ_PDF_FILE_NAME: &str = "boq.pdf";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to render PDF: {0}")]
    Pdf(String),
}

// A4 portrait, in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 40;
const TITLE_Y: i64 = 806;
const TABLE_TOP: i64 = 780;
const ROW_HEIGHT: i64 = 20;
const FONT_SIZE: i64 = 10;
const CELL_PAD: i64 = 6;

/// Left edge of each column; the last column ends at the right margin.
const COLUMN_X: [i64; 4] = [MARGIN, 300, 360, 460];

/// Render a prepared table to PDF bytes.
///
/// Rows flow onto as many A4 pages as needed. Every page repeats the header
/// band; the title sits on the first page and the total on the last.
pub fn render_table_pdf(table: &BoqTable) -> Result<Vec<u8>, DocumentError> {
    let pages = layout_pages(table);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for content in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    tracing::debug!(pages = count, rows = table.rows.len(), "rendered BOQ PDF");

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;
    Ok(bytes)
}

fn baseline(row_top: i64) -> i64 {
    row_top - ROW_HEIGHT + 7
}

/// Content streams (PDF operators), one per page.
fn layout_pages(table: &BoqTable) -> Vec<Vec<u8>> {
    let right_edge = PAGE_WIDTH - MARGIN;
    let mut rows = table.rows.iter().peekable();
    let mut pages = Vec::new();

    loop {
        let mut ops = ContentWriter::default();
        if pages.is_empty() {
            ops.text("F2", 14, MARGIN, TITLE_Y, &table.title);
        }

        // Header band: dark fill, white bold text.
        let mut y = TABLE_TOP;
        ops.fill_rect(0.157, MARGIN, y - ROW_HEIGHT, right_edge - MARGIN, ROW_HEIGHT);
        ops.fill_gray(1.0);
        for (col, label) in table.header().iter().enumerate() {
            ops.cell("F2", col, baseline(y), label);
        }
        ops.fill_gray(0.0);
        y -= ROW_HEIGHT;

        while let Some(row) = rows.peek() {
            if y - ROW_HEIGHT < MARGIN {
                break;
            }
            for (col, value) in row.iter().enumerate() {
                ops.cell("F1", col, baseline(y), value);
            }
            ops.rule(MARGIN, right_edge, y - ROW_HEIGHT);
            y -= ROW_HEIGHT;
            rows.next();
        }

        if rows.peek().is_none() && y - ROW_HEIGHT >= MARGIN {
            write_footer(&mut ops, table, y);
            pages.push(ops.finish());
            return pages;
        }
        pages.push(ops.finish());
    }
}

/// "Total" right-aligned across the first three columns.
fn write_footer(ops: &mut ContentWriter, table: &BoqTable, row_top: i64) {
    let label = table.footer_label();
    let label_right = COLUMN_X[3] - CELL_PAD;
    ops.text(
        "F2",
        FONT_SIZE,
        label_right - text_width(label, FONT_SIZE),
        baseline(row_top),
        label,
    );
    ops.cell("F2", 3, baseline(row_top), &table.total);
}

/// Approximate Helvetica advance width in points.
fn text_width(text: &str, size: i64) -> i64 {
    let units: i64 = text
        .chars()
        .map(|c| match c {
            ',' | '.' | ' ' | 'i' | 'l' | 'j' | 't' | 'f' | 'I' => 278,
            'm' | 'w' | 'M' | 'W' => 833,
            _ => 556,
        })
        .sum();
    units * size / 1000
}

#[derive(Default)]
struct ContentWriter {
    buf: Vec<u8>,
}

impl ContentWriter {
    fn raw(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(b'\n');
    }

    fn fill_gray(&mut self, level: f32) {
        self.raw(&format!("{level:.3} g"));
    }

    fn fill_rect(&mut self, gray: f32, x: i64, y: i64, w: i64, h: i64) {
        self.fill_gray(gray);
        self.raw(&format!("{x} {y} {w} {h} re f"));
    }

    fn rule(&mut self, x0: i64, x1: i64, y: i64) {
        self.raw(&format!("0.5 w 0.85 G {x0} {y} m {x1} {y} l S"));
    }

    /// Column 0 is left-aligned; numeric columns are right-aligned.
    fn cell(&mut self, font: &str, col: usize, baseline: i64, value: &str) {
        let x = if col == 0 {
            COLUMN_X[0] + CELL_PAD
        } else {
            let right = COLUMN_X.get(col + 1).copied().unwrap_or(PAGE_WIDTH - MARGIN);
            right - CELL_PAD - text_width(value, FONT_SIZE)
        };
        self.text(font, FONT_SIZE, x, baseline, value);
    }

    fn text(&mut self, font: &str, size: i64, x: i64, y: i64, value: &str) {
        self.raw(&format!("BT /{font} {size} Tf {x} {y} Td"));
        self.buf.push(b'(');
        self.buf.extend(encode_literal(value));
        self.buf.extend_from_slice(b") Tj ET\n");
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Escape a string for a PDF literal, mapping to single-byte WinAnsi.
///
/// Characters outside Latin-1 are replaced with `?`.
fn encode_literal(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            c if (c as u32) < 0x20 => out.push(b' '),
            c if (c as u32) < 0x100 => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use boqkit_boq::{Line, compute_total};
    use boqkit_catalog::Item;

    fn table(lines: &[Line]) -> BoqTable {
        BoqTable::build(lines, compute_total(lines), &NumberFormat::en_us())
    }

    fn lines() -> Vec<Line> {
        vec![
            Line::snapshot(&Item::new("1", "Cement (50kg)", 500.0)),
            Line::snapshot(&Item::new("2", "Bolt", 2.5)),
        ]
    }

    fn many(n: usize) -> Vec<Line> {
        (0..n)
            .map(|i| Line::snapshot(&Item::new(i.to_string(), format!("Row{i}"), 1.0)))
            .collect()
    }

    fn text_of(pages: &[Vec<u8>]) -> Vec<String> {
        pages
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render_table_pdf(&table(&lines())).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn content_contains_header_rows_and_total() {
        let pages = text_of(&layout_pages(&table(&lines())));
        assert_eq!(pages.len(), 1);
        let content = &pages[0];

        assert!(content.contains("(Bill of Quantities) Tj"));
        assert!(content.contains("(Unit Price) Tj"));
        assert!(content.contains("(Cement \\(50kg\\)) Tj"));
        assert!(content.contains("(Total) Tj"));
        assert!(content.contains("(502.5) Tj"));
    }

    #[test]
    fn empty_table_still_has_header_and_total() {
        let pages = text_of(&layout_pages(&table(&[])));
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("(Subtotal) Tj"));
        assert!(pages[0].contains("(Total) Tj"));
    }

    #[test]
    fn long_boq_flows_onto_more_pages_without_losing_rows() {
        let lines = many(100);
        let pages = text_of(&layout_pages(&table(&lines)));
        assert!(pages.len() > 1);

        let all = pages.concat();
        for i in 0..100 {
            assert!(all.contains(&format!("(Row{i}) Tj")), "row {i} missing");
        }

        for page in &pages {
            assert!(page.contains("(Unit Price) Tj"));
        }
        assert_eq!(pages.iter().filter(|p| p.contains("(Total) Tj")).count(), 1);
        assert!(pages.last().is_some_and(|p| p.contains("(Total) Tj") && p.contains("(100) Tj")));
        assert_eq!(pages.iter().filter(|p| p.contains("Bill of Quantities")).count(), 1);

        let bytes = render_table_pdf(&table(&lines)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), pages.len());
    }

    #[test]
    fn footer_moves_to_a_new_page_when_rows_fill_the_last_one() {
        // 36 rows fill the first page exactly.
        let pages = text_of(&layout_pages(&table(&many(36))));
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("(Row35) Tj"));
        assert!(!pages[0].contains("(Total) Tj"));
        assert!(pages[1].contains("(Total) Tj"));
    }

    #[test]
    fn literal_encoding_escapes_and_replaces() {
        assert_eq!(encode_literal("a(b)\\"), b"a\\(b\\)\\\\".to_vec());
        assert_eq!(encode_literal("café"), vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(encode_literal("₦"), b"?".to_vec());
    }
}
