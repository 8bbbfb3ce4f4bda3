//! Locale-formatted price text normalization
//!
//! Fixed to the storefront's locale: `.` groups thousands, `,` marks decimals,
//! the euro sign and (narrow) non-breaking spaces are decoration.

use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

const CURRENCY_GLYPHS: &[char] = &['€'];
const GROUPING_SEPARATOR: char = '.';
const DECIMAL_SEPARATOR: char = ',';

pub struct PriceTextNormalizer;

impl PriceTextNormalizer {
    /// Turn e.g. `"39.545\u{a0}€"` into `39545.0`.
    pub fn normalize(raw_text: &str) -> ParsingResult<f64> {
        let cleaned: String = raw_text
            .chars()
            .filter(|c| {
                *c != GROUPING_SEPARATOR && !CURRENCY_GLYPHS.contains(c) && !c.is_whitespace()
            })
            .map(|c| if c == DECIMAL_SEPARATOR { '.' } else { c })
            .collect();

        if cleaned.is_empty() {
            return Err(ParsingError::malformed_price_text(raw_text, "no digits left after cleanup"));
        }
        // f64::from_str also accepts "inf" and "NaN"; a price is digits only.
        if !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(ParsingError::malformed_price_text(raw_text, format!("'{cleaned}' is not a number")));
        }

        let value = cleaned
            .parse::<f64>()
            .map_err(|e| ParsingError::malformed_price_text(raw_text, e.to_string()))?;

        if !value.is_finite() {
            return Err(ParsingError::malformed_price_text(raw_text, "value is not finite"));
        }
        Ok(value)
    }
}
