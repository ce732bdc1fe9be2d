//! Parsing and formatting of locale-written numbers.
//!
//! The dataset's primary convention is "euro style": `.` groups thousands and `,`
//! separates decimals (`12.345,67`). Parsing first tries that convention strictly
//! and then falls back to a separator-position heuristic; formatting always emits
//! the euro convention with two decimals.

use once_cell::sync::Lazy;
use regex::Regex;

/// Strict euro pattern: 1-3 digits, dot-separated groups of 3, optional comma decimals.
pub(crate) static EURO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^-?\d{1,3}(\.\d{3})*(,\d+)?$").expect("Hard-coded regex pattern should be valid")
});

/// Plain pattern: an integer or a dot-decimal.
pub(crate) static PLAIN_DOT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^-?\d+(\.\d+)?$").expect("Hard-coded regex pattern should be valid")
});

const CURRENCY_SYMBOLS: [char; 4] = ['€', '$', '£', '¥'];

/// Removes currency symbols and every whitespace character.
fn strip_decorations(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect()
}

/// Parses a number written in the euro convention or, failing that, by heuristic.
///
/// Heuristic rules when the strict euro pattern does not match:
/// - both `.` and `,` present: the later one is the decimal separator;
/// - only `,` present: decimal iff exactly two digits follow its last occurrence,
///   otherwise thousands grouping;
/// - only `.` present: same rule as `,`.
///
/// Returns `None` when no numeric reading exists.
///
/// ```rust
/// use tabula::numeric::parse_locale_number;
///
/// assert_eq!(parse_locale_number("12.345,67 €"), Some(12345.67));
/// assert_eq!(parse_locale_number("1,234.56"), Some(1234.56));
/// assert_eq!(parse_locale_number("1,234,567"), Some(1234567.0));
/// assert_eq!(parse_locale_number("n/a"), None);
/// ```
pub fn parse_locale_number(text: &str) -> Option<f64> {
    let s = strip_decorations(text);
    if s.is_empty() {
        return None;
    }

    if let Some(value) = parse_euro_strict(&s) {
        return Some(value);
    }

    let normalized = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) => {
            if comma > dot {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (None, Some(comma)) => resolve_single_separator(&s, ',', comma),
        (Some(dot), None) => resolve_single_separator(&s, '.', dot),
        (None, None) => s,
    };

    parse_finite(&normalized)
}

/// Parses `text` only if it matches the strict euro pattern.
///
/// This is the reading used when exporting, where a value must unambiguously be a
/// euro-style number before it is rewritten.
pub fn parse_euro_strict(text: &str) -> Option<f64> {
    let s = text.trim();
    if !EURO_PATTERN.is_match(s) {
        return None;
    }
    parse_finite(&s.replace('.', "").replace(',', "."))
}

/// Parses `text` as a plain dot-decimal after stripping currency and spaces.
pub fn parse_plain_number(text: &str) -> Option<f64> {
    parse_finite(&strip_decorations(text))
}

fn resolve_single_separator(s: &str, separator: char, last: usize) -> String {
    let decimals = s[last + separator.len_utf8()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();
    let trailing = s.len() - last - separator.len_utf8();
    if decimals == 2 && trailing == 2 {
        let (int_part, frac_part) = s.split_at(last);
        let int_part: String = int_part.chars().filter(|c| *c != separator).collect();
        format!("{int_part}.{}", &frac_part[separator.len_utf8()..])
    } else {
        s.chars().filter(|c| *c != separator).collect()
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    // Rust accepts "inf"/"NaN" spellings that are never amounts
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a number in the euro convention with exactly two decimals.
///
/// ```rust
/// use tabula::numeric::format_locale_number;
///
/// assert_eq!(format_locale_number(1234567.891), "1.234.567,89");
/// assert_eq!(format_locale_number(-999.5), "-999,50");
/// assert_eq!(format_locale_number(0.0), "0,00");
/// ```
pub fn format_locale_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    let negative = value < 0.0 && fixed.bytes().any(|b| (b'1'..=b'9').contains(&b));
    if negative {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped.push(',');
    grouped.push_str(dec_part);
    grouped
}

/// Formats a number for machine consumption: two decimals, dot decimal, no grouping.
pub fn format_export_number(value: f64) -> String {
    format!("{value:.2}")
}
