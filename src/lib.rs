#![deny(rust_2018_idioms)]

pub mod config;
pub use config::Config;

pub mod schema;

pub mod dates;

pub mod expand;

pub mod group;

pub mod rates;
pub use rates::function::{by_country, company_rates, consolidation_rates, export};

pub mod normalize_headers;
pub use normalize_headers::function::normalize_headers;

use std::borrow::Cow;

/// Replace non-breaking spaces as they are common in spreadsheet exports and trim the result.
pub fn clean_cell(value: &str) -> Cow<'_, str> {
    if value.contains('\u{a0}') {
        Cow::Owned(value.replace('\u{a0}', " ").trim().to_owned())
    } else {
        Cow::Borrowed(value.trim())
    }
}

/// Parse a rate as found in spreadsheet exports, dropping thousands separators and
/// reading `decimal_separator` as the decimal point.
///
/// Returns `None` for empty cells, `NaN` and anything else that isn't a finite number.
pub fn parse_rate(value: &str, decimal_separator: char) -> Option<f64> {
    let value = clean_cell(value);
    if value.is_empty() {
        return None;
    }
    let thousands_separator = if decimal_separator == ',' { '.' } else { ',' };
    let number: String = value
        .chars()
        .filter(|c| *c != thousands_separator && *c != ' ' && *c != '\'')
        .map(|c| if c == decimal_separator { '.' } else { c })
        .collect();
    number.parse::<f64>().ok().filter(|rate| rate.is_finite())
}

/// The most fractional digits rates can be rounded to.
pub const MAX_ROUND_DIGITS: u32 = 15;

/// Round `rate` to `digits` fractional digits, ties to even.
///
/// `rate` is returned unchanged if scaling it by `10^digits` isn't finite.
pub fn round_rate(rate: f64, digits: u32) -> f64 {
    let Ok(exponent) = i32::try_from(digits) else {
        return rate;
    };
    let factor = 10f64.powi(exponent);
    let scaled = rate * factor;
    if !factor.is_finite() || !scaled.is_finite() {
        return rate;
    }
    scaled.round_ties_even() / factor
}
