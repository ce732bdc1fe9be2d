//! Accent- and case-insensitive substring search over every column of a table.

use rusqlite::{params_from_iter, ParamsFromIter};

use crate::error::Result;
use crate::security::{InputValidator, SqlSecurity};
use crate::text::fold;

/// A row predicate built from free-text search input.
///
/// An empty (or whitespace-only) query matches every row. Otherwise a row matches
/// when any column, cast to text and folded, contains the folded query. The query is
/// bound as a single `?1` parameter; LIKE wildcards in it are escaped.
///
/// ```rust
/// use tabula::query::SearchFilter;
///
/// let columns = vec!["Tipo".to_string(), "Importe".to_string()];
/// let filter = SearchFilter::build(&columns, "  Obras ").unwrap();
/// assert_eq!(filter.pattern(), Some("%obras%"));
/// assert!(filter.where_clause().starts_with("WHERE ("));
///
/// assert!(SearchFilter::build(&columns, "   ").unwrap().is_match_all());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    query: String,
    condition: Option<String>,
    pattern: Option<String>,
}

impl SearchFilter {
    /// A filter that matches every row.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Builds a filter over `columns` for the user's `query`.
    pub fn build(columns: &[String], query: &str) -> Result<Self> {
        InputValidator::validate_search_text(query)?;

        let trimmed = query.trim();
        if trimmed.is_empty() || columns.is_empty() {
            return Ok(Self::match_all());
        }

        let folded = fold(trimmed);
        let pattern = format!("%{}%", SqlSecurity::escape_like(&folded));

        let mut parts = Vec::with_capacity(columns.len());
        for column in columns {
            let col = SqlSecurity::quote_identifier(column)?;
            parts.push(format!(
                "unaccent_lower(CAST({col} AS TEXT)) LIKE ?1 ESCAPE '\\'"
            ));
        }

        Ok(Self {
            query: trimmed.to_string(),
            condition: Some(format!("({})", parts.join(" OR "))),
            pattern: Some(pattern),
        })
    }

    pub fn is_match_all(&self) -> bool {
        self.condition.is_none()
    }

    /// The trimmed user query; empty for match-all.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The bound LIKE pattern, if any.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// `WHERE (...)`, or the empty string for match-all.
    pub fn where_clause(&self) -> String {
        match &self.condition {
            Some(condition) => format!("WHERE {condition}"),
            None => String::new(),
        }
    }

    /// Combines the filter with an extra condition.
    pub fn where_with(&self, extra: &str) -> String {
        match &self.condition {
            Some(condition) => format!("WHERE {condition} AND ({extra})"),
            None => format!("WHERE {extra}"),
        }
    }

    /// Parameters to bind alongside any statement built from this filter.
    pub fn params(&self) -> ParamsFromIter<std::option::Iter<'_, String>> {
        params_from_iter(self.pattern.iter())
    }
}
