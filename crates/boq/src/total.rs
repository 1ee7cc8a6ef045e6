use crate::line::Line;

/// `unit_price * quantity` for one line.
pub fn subtotal(line: &Line) -> f64 {
    line.unit_price * line.quantity as f64
}

/// Grand total of a line list; exactly `0.0` when empty.
pub fn compute_total(lines: &[Line]) -> f64 {
    lines.iter().map(subtotal).sum()
}
