//! Table and column discovery.

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::error::{ErrorContext, Result, TabulaError};

/// A column as declared in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared SQL type; frequently empty for loosely typed imports.
    pub declared_type: String,
}

/// Column names in declaration order.
pub fn column_names(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.name.clone()).collect()
}

/// Returns the first column whose name equals one of `candidates`, ignoring case.
///
/// Candidates are tried in order, so the candidate list expresses priority.
///
/// ```rust
/// use tabula::schema::{pick_first_column, Column};
///
/// let columns = vec![
///     Column { name: "IMPORTE".into(), declared_type: String::new() },
///     Column { name: "Importe_con_iva".into(), declared_type: String::new() },
/// ];
/// let candidates = vec!["Importe_con_iva".to_string(), "importe".to_string()];
/// assert_eq!(pick_first_column(&columns, &candidates), Some("Importe_con_iva"));
/// ```
pub fn pick_first_column<'a>(columns: &'a [Column], candidates: &[String]) -> Option<&'a str> {
    candidates.iter().find_map(|candidate| {
        columns
            .iter()
            .find(|column| column.name.to_lowercase() == candidate.to_lowercase())
            .map(|column| column.name.as_str())
    })
}

/// Schema queries over one connection.
pub struct Schema<'c> {
    conn: &'c Connection,
    config: &'c EngineConfig,
}

impl<'c> Schema<'c> {
    pub fn new(conn: &'c Connection, config: &'c EngineConfig) -> Self {
        Self { conn, config }
    }

    /// All user tables, sorted by name, excluding SQLite internals.
    #[instrument(skip(self))]
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .metadata_context("listing tables")?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .metadata_context("listing tables")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .metadata_context("listing tables")?;
        debug!(count = tables.len(), "tables listed");
        Ok(tables)
    }

    /// Tables that are not attachment tables.
    pub fn list_base_tables(&self) -> Result<Vec<String>> {
        Ok(self
            .list_tables()?
            .into_iter()
            .filter(|table| !self.config.is_attachment_table(table))
            .collect())
    }

    /// Columns of `table` in declaration order.
    #[instrument(skip(self))]
    pub fn columns(&self, table: &str) -> Result<Vec<Column>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
            .metadata_context(format!("reading columns of '{table}'"))?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(Column {
                    name: row.get(0)?,
                    declared_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                })
            })
            .metadata_context(format!("reading columns of '{table}'"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .metadata_context(format!("reading columns of '{table}'"))?;

        if columns.is_empty() {
            return Err(TabulaError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()
            .metadata_context(format!("looking up table '{table}'"))?;
        Ok(found.is_some())
    }

    /// The attachment table for `base`, trying each suffix in priority order.
    pub fn find_attachment_table(&self, base: &str) -> Result<Option<String>> {
        for suffix in &self.config.attachment_suffixes {
            let candidate = format!("{base}{suffix}");
            if self.table_exists(&candidate)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}
