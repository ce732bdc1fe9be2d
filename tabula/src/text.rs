//! Accent- and case-insensitive text normalization.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization as _;

/// Lowercases `s` and strips diacritics.
///
/// The text is decomposed (NFD) so composed letters such as `é` become a base
/// letter plus a combining mark, and the marks are dropped.
///
/// ```rust
/// assert_eq!(tabula::text::fold("Café ÁLVAREZ"), "cafe alvarez");
/// ```
pub fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfd().filter(|c| !is_combining_mark(*c)) {
        out.extend(c.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_accents_and_case() {
        assert_eq!(fold("CAFÉ"), "cafe");
        assert_eq!(fold("Adxudicación"), "adxudicacion");
        assert_eq!(fold("Müller Ñandú"), "muller nandu");
    }

    #[test]
    fn test_fold_keeps_non_letters() {
        assert_eq!(fold("1.234,50 €"), "1.234,50 €");
        assert_eq!(fold(""), "");
    }
}
