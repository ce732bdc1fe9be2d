//! Numeric style detection and locale-aware value normalization.
//!
//! - [`StyleDetector`] samples a column (restricted to the active filter) and
//!   decides whether its text is written as `12.345,67`, `12345.67`, or neither.
//! - [`parse_locale_number`] and [`format_locale_number`] convert between such text
//!   and `f64`; formatting is a left inverse of parsing at two decimals.

mod locale;
mod style;

pub use locale::{
    format_export_number, format_locale_number, parse_euro_strict, parse_locale_number,
    parse_plain_number,
};
pub use style::{NumericStyle, StyleDetector};
