//! Numeric style detection by sampling.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::locale::{parse_locale_number, parse_plain_number, EURO_PATTERN, PLAIN_DOT_PATTERN};
use crate::error::Result;
use crate::query::SearchFilter;
use crate::security::SqlSecurity;
use crate::store::Value;

/// The number-writing convention of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericStyle {
    /// Not numeric; ordering and grouping use the raw value.
    #[default]
    None,
    /// `12.345,67`
    ThousandsDotDecimalComma,
    /// `12345.67`
    PlainDot,
}

impl NumericStyle {
    /// Returns true for either numeric convention.
    pub fn is_numeric(self) -> bool {
        !matches!(self, NumericStyle::None)
    }

    /// Tag understood by the `locale_number` SQL function.
    pub fn sql_tag(self) -> Option<&'static str> {
        match self {
            NumericStyle::None => None,
            NumericStyle::ThousandsDotDecimalComma => Some("euro"),
            NumericStyle::PlainDot => Some("dot"),
        }
    }

    /// Inverse of [`NumericStyle::sql_tag`].
    pub fn from_sql_tag(tag: &str) -> Self {
        match tag {
            "euro" => NumericStyle::ThousandsDotDecimalComma,
            "dot" => NumericStyle::PlainDot,
            _ => NumericStyle::None,
        }
    }

    /// Parses a textual value under this convention.
    pub fn parse(self, text: &str) -> Option<f64> {
        match self {
            NumericStyle::None => None,
            NumericStyle::ThousandsDotDecimalComma => parse_locale_number(text),
            NumericStyle::PlainDot => parse_plain_number(text),
        }
    }

    /// Classifies a set of sampled values.
    ///
    /// Ties go to the euro convention: short integers such as `123` satisfy both
    /// patterns and the dataset's source locale is comma-decimal.
    pub fn classify<'a>(samples: impl IntoIterator<Item = &'a str>) -> Self {
        let mut euro = 0usize;
        let mut dot = 0usize;
        for sample in samples {
            let s = sample.trim();
            if EURO_PATTERN.is_match(s) {
                euro += 1;
            }
            if PLAIN_DOT_PATTERN.is_match(s) {
                dot += 1;
            }
        }
        match (euro, dot) {
            (0, 0) => NumericStyle::None,
            (e, d) if e >= d => NumericStyle::ThousandsDotDecimalComma,
            _ => NumericStyle::PlainDot,
        }
    }
}

/// Samples a column under the active filter and classifies its convention.
#[derive(Debug, Clone)]
pub struct StyleDetector {
    sample_size: usize,
}

impl Default for StyleDetector {
    fn default() -> Self {
        Self::new(50)
    }
}

impl StyleDetector {
    /// Creates a detector sampling at most `sample_size` values.
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size: sample_size.max(1),
        }
    }

    /// Detects the numeric style of `table.column` over the rows matched by `filter`.
    ///
    /// A failing sample query degrades to [`NumericStyle::None`].
    #[instrument(skip(self, conn, filter), fields(table = %table, column = %column))]
    pub fn detect(
        &self,
        conn: &Connection,
        table: &str,
        column: &str,
        filter: &SearchFilter,
    ) -> NumericStyle {
        match self.sample(conn, table, column, filter) {
            Ok(samples) => {
                let style = NumericStyle::classify(samples.iter().map(String::as_str));
                debug!(samples = samples.len(), ?style, "numeric style detected");
                style
            }
            Err(e) => {
                warn!(error = %e, "numeric style sampling failed, treating column as text");
                NumericStyle::None
            }
        }
    }

    fn sample(
        &self,
        conn: &Connection,
        table: &str,
        column: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<String>> {
        let col = SqlSecurity::quote_identifier(column)?;
        let tbl = SqlSecurity::quote_identifier(table)?;
        let where_clause =
            filter.where_with(&format!("{col} IS NOT NULL AND TRIM(CAST({col} AS TEXT)) <> ''"));
        let sql = format!(
            "SELECT {col} FROM {tbl} {where_clause} LIMIT {}",
            self.sample_size
        );

        let mut stmt = conn.prepare(&sql)?;
        let samples = stmt
            .query_map(filter.params(), |row| row.get_ref(0).map(Value::from))?
            .filter_map(|value| value.ok())
            .filter(|value| !value.is_null())
            .map(|value| value.to_string())
            .collect();
        Ok(samples)
    }
}
