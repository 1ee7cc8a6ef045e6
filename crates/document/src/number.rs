//! Locale-style number formatting for money and quantities.

/// Digit grouping and decimal conventions.
///
/// The default mirrors en-US display: `,` between thousands, `.` before the
/// fraction, at most three fraction digits with trailing zeros removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pub grouping: Option<char>,
    pub decimal: char,
    pub max_fraction_digits: u32,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::en_us()
    }
}

impl NumberFormat {
    pub fn en_us() -> Self {
        Self {
            grouping: Some(','),
            decimal: '.',
            max_fraction_digits: 3,
        }
    }

    /// Format `value`, rounding half away from zero at the last fraction digit.
    pub fn format(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "∞" } else { "-∞" }.to_string();
        }

        let digits = self.max_fraction_digits.min(9);
        let scale = 10u128.pow(digits);
        // `as` saturates for magnitudes beyond u128.
        let scaled = (value.abs() * scale as f64).round() as u128;
        let whole = scaled / scale;
        let fraction = scaled % scale;

        let mut out = String::new();
        if value < 0.0 && scaled != 0 {
            out.push('-');
        }
        out.push_str(&self.group(whole));

        if fraction > 0 {
            let padded = format!("{:0width$}", fraction, width = digits as usize);
            out.push(self.decimal);
            out.push_str(padded.trim_end_matches('0'));
        }

        out
    }

    fn group(&self, whole: u128) -> String {
        let digits = whole.to_string();
        let Some(sep) = self.grouping else {
            return digits;
        };

        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (idx, ch) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                out.push(sep);
            }
            out.push(ch);
        }
        out
    }
}
