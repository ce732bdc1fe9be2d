//! Sort specifications and their ORDER BY rendering.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::SearchFilter;
use crate::error::Result;
use crate::numeric::{NumericStyle, StyleDetector};
use crate::security::SqlSecurity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Requested ordering of a table view. No column means natural order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn natural() -> Self {
        Self::default()
    }

    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        let column = column.into();
        Self {
            column: (!column.trim().is_empty()).then_some(column),
            direction,
        }
    }
}

/// SQL expression that yields the numeric value of `column` under `style`,
/// or the quoted column itself for non-numeric styles.
pub fn sort_key_expression(column: &str, style: NumericStyle) -> Result<String> {
    let col = SqlSecurity::quote_identifier(column)?;
    Ok(match style.sql_tag() {
        Some(tag) => format!("locale_number({col}, '{tag}')"),
        None => col,
    })
}

/// A resolved ORDER BY clause.
///
/// Numeric columns sort by their parsed value so `9,50` precedes `10,00`; text
/// columns sort by their raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderExpression {
    key: Option<String>,
    direction: SortDirection,
    style: NumericStyle,
}

impl OrderExpression {
    /// Resolves `sort` against `table`, detecting the column's style under `filter`.
    pub fn build(
        conn: &Connection,
        detector: &StyleDetector,
        table: &str,
        sort: &SortSpec,
        filter: &SearchFilter,
    ) -> Result<Self> {
        let Some(column) = sort.column.as_deref() else {
            return Ok(Self::default());
        };
        let style = detector.detect(conn, table, column, filter);
        Ok(Self {
            key: Some(sort_key_expression(column, style)?),
            direction: sort.direction,
            style,
        })
    }

    pub fn style(&self) -> NumericStyle {
        self.style
    }

    /// `ORDER BY <key> ASC|DESC`, or the empty string for natural order.
    pub fn to_sql(&self) -> String {
        match &self.key {
            Some(key) => format!("ORDER BY {key} {}", self.direction.as_sql()),
            None => String::new(),
        }
    }
}
