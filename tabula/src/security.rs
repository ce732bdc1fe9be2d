//! Security utilities for building SQL text.
//!
//! Table and column names are discovered at runtime and cannot be bound as
//! parameters, so they are always wrapped as quoted identifiers. Everything else
//! that originates from a user (search text) travels as a bound parameter.

use crate::error::{Result, TabulaError};

/// Maximum accepted identifier length in bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 1024;

/// Maximum accepted search text length in bytes.
pub const MAX_SEARCH_LENGTH: usize = 1000;

/// SQL identifier escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Wraps an identifier in double quotes, doubling any embedded quote.
    ///
    /// Any non-empty name without NUL bytes is accepted, including spaces,
    /// accents and punctuation.
    ///
    /// # Examples
    /// ```rust
    /// use tabula::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_identifier("Importe").unwrap(), "\"Importe\"");
    /// assert_eq!(
    ///     SqlSecurity::quote_identifier("a\"; DROP TABLE t; --").unwrap(),
    ///     "\"a\"\"; DROP TABLE t; --\""
    /// );
    /// assert!(SqlSecurity::quote_identifier("").is_err());
    /// ```
    pub fn quote_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Validates an identifier without quoting it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.is_empty() {
            return Err(TabulaError::SecurityError(
                "SQL identifier cannot be empty".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(TabulaError::SecurityError(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LENGTH} bytes)"
            )));
        }

        if identifier.contains('\0') {
            return Err(TabulaError::SecurityError(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        Ok(())
    }

    /// Escapes `%`, `_` and `\` so a value is matched literally by `LIKE ... ESCAPE '\'`.
    pub fn escape_like(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if matches!(c, '%' | '_' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
}

/// Input validation for request parameters.
pub struct InputValidator;

impl InputValidator {
    /// Validates free-text search input.
    pub fn validate_search_text(value: &str) -> Result<()> {
        if value.len() > MAX_SEARCH_LENGTH {
            return Err(TabulaError::SecurityError(format!(
                "search text too long: {} bytes (max {MAX_SEARCH_LENGTH})",
                value.len()
            )));
        }
        if value.contains('\0') {
            return Err(TabulaError::SecurityError(
                "search text cannot contain null bytes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain_identifier() {
        assert_eq!(
            SqlSecurity::quote_identifier("customer_id").unwrap(),
            "\"customer_id\""
        );
        assert_eq!(
            SqlSecurity::quote_identifier("Tipo licitación").unwrap(),
            "\"Tipo licitación\""
        );
    }

    #[test]
    fn test_quote_doubles_embedded_quotes() {
        assert_eq!(
            SqlSecurity::quote_identifier("col\"with\"quotes").unwrap(),
            "\"col\"\"with\"\"quotes\""
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(SqlSecurity::quote_identifier("").is_err());
        assert!(SqlSecurity::quote_identifier("nul\0byte").is_err());
        assert!(SqlSecurity::quote_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(SqlSecurity::escape_like("100%"), "100\\%");
        assert_eq!(SqlSecurity::escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(SqlSecurity::escape_like("plain"), "plain");
    }

    #[test]
    fn test_search_text_validation() {
        assert!(InputValidator::validate_search_text("café con leche").is_ok());
        assert!(InputValidator::validate_search_text("x\0y").is_err());
        assert!(InputValidator::validate_search_text(&"q".repeat(MAX_SEARCH_LENGTH + 1)).is_err());
    }
}
