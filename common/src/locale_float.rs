//! Parsing of decimal numbers written with either a comma or a dot separator.
//!
//! Reference tables exported from spreadsheets mix `48,8566` and `48.8566`
//! freely, sometimes within one file.

pub trait ParseLocaleFloat {
    /// Parses a finite `f64`, accepting `,` as the decimal separator.
    ///
    /// Surrounding whitespace is ignored. Empty cells, thousands separators,
    /// `NaN` and infinities yield `None`.
    fn parse_locale_f64(&self) -> Option<f64>;
}

impl ParseLocaleFloat for str {
    fn parse_locale_f64(&self) -> Option<f64> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return None;
        }

        let parsed = if trimmed.contains(',') {
            trimmed.replace(',', ".").parse::<f64>()
        } else {
            trimmed.parse::<f64>()
        };

        parsed.ok().filter(|value| value.is_finite())
    }
}

impl ParseLocaleFloat for String {
    fn parse_locale_f64(&self) -> Option<f64> {
        self.as_str().parse_locale_f64()
    }
}

impl ParseLocaleFloat for &str {
    fn parse_locale_f64(&self) -> Option<f64> {
        (*self).parse_locale_f64()
    }
}
