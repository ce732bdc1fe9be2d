//! Filtered, ordered, paginated table reads.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{OrderExpression, PageWindow, SearchFilter, SortSpec};
use crate::config::EngineConfig;
use crate::error::{Result, TabulaError};
use crate::log_query;
use crate::numeric::{NumericStyle, StyleDetector};
use crate::schema::{column_names, Column, Schema};
use crate::security::SqlSecurity;
use crate::store::{Row, Value};

/// A request for one page of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRequest {
    pub table: String,
    pub query: String,
    pub sort: SortSpec,
    /// 1-based; out-of-range values are clamped
    pub page: i64,
    /// Falls back to the configured default page size
    pub page_size: Option<usize>,
}

impl TableRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            page: 1,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// One page of rows plus the pagination state needed to render navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub table: String,
    pub query: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
    pub page_size: usize,
    pub offset: usize,
    pub sort: SortSpec,
    /// Numeric style of the sort column, when sorting
    pub sort_style: NumericStyle,
}

/// Counts rows of `table` matched by `filter`.
pub fn count_rows(
    conn: &Connection,
    config: &EngineConfig,
    table: &str,
    filter: &SearchFilter,
) -> Result<usize> {
    let tbl = SqlSecurity::quote_identifier(table)?;
    let sql = format!("SELECT COUNT(*) FROM {tbl} {}", filter.where_clause());
    log_query!(config.log, &sql);
    let count: i64 = conn.query_row(&sql, filter.params(), |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Reads the rows of `table` matched by `filter` in `order`.
///
/// With a `window` only that page is read; without one every matching row is.
pub fn fetch_rows(
    conn: &Connection,
    config: &EngineConfig,
    table: &str,
    columns: &[Column],
    filter: &SearchFilter,
    order: &OrderExpression,
    window: Option<&PageWindow>,
) -> Result<Vec<Row>> {
    let tbl = SqlSecurity::quote_identifier(table)?;
    let projection = columns
        .iter()
        .map(|c| SqlSecurity::quote_identifier(&c.name))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    let limit = match window {
        Some(w) => format!("LIMIT {} OFFSET {}", w.limit, w.offset),
        None => String::new(),
    };
    let sql = format!(
        "SELECT {projection} FROM {tbl} {} {} {limit}",
        filter.where_clause(),
        order.to_sql()
    );
    log_query!(config.log, &sql);

    let names = column_names(columns);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(filter.params(), |row| {
            let mut cells = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                cells.push((name.clone(), Value::from(row.get_ref(i)?)));
            }
            Ok(Row::new(cells))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Builds the ORDER BY for `request`, rejecting a sort column the table lacks.
///
/// SQLite would read an unknown quoted name as a string literal and silently
/// leave the rows unsorted.
fn resolve_order(
    conn: &Connection,
    config: &EngineConfig,
    request: &TableRequest,
    columns: &[Column],
    filter: &SearchFilter,
) -> Result<OrderExpression> {
    if let Some(column) = request.sort.column.as_deref() {
        if !columns.iter().any(|c| c.name.eq_ignore_ascii_case(column)) {
            return Err(TabulaError::column_not_found(&request.table, column));
        }
    }
    let detector = StyleDetector::new(config.sample_size);
    OrderExpression::build(conn, &detector, &request.table, &request.sort, filter)
}

/// Serves one page of a table view.
///
/// Metadata failures and query failures both surface as errors; an empty
/// result is a page with no rows.
#[instrument(skip(conn, config), fields(table = %request.table, page = request.page))]
pub fn load_page(
    conn: &Connection,
    config: &EngineConfig,
    request: &TableRequest,
) -> Result<TablePage> {
    let columns = Schema::new(conn, config).columns(&request.table)?;
    let filter = SearchFilter::build(&column_names(&columns), &request.query)?;
    let order = resolve_order(conn, config, request, &columns, &filter)?;

    let total = count_rows(conn, config, &request.table, &filter)?;
    let window = PageWindow::compute(
        total,
        request.page_size.unwrap_or(config.default_page_size),
        request.page,
    );
    let rows = if window.limit == 0 {
        Vec::new()
    } else {
        fetch_rows(
            conn,
            config,
            &request.table,
            &columns,
            &filter,
            &order,
            Some(&window),
        )?
    };

    Ok(TablePage {
        table: request.table.clone(),
        query: filter.query().to_string(),
        columns,
        rows,
        total: window.total,
        page: window.page,
        pages: window.pages,
        page_size: window.page_size,
        offset: window.offset,
        sort: request.sort.clone(),
        sort_style: order.style(),
    })
}

/// Reads every row matched by a request, ignoring its page fields.
pub fn load_all(
    conn: &Connection,
    config: &EngineConfig,
    request: &TableRequest,
) -> Result<(Vec<Column>, Vec<Row>)> {
    let columns = Schema::new(conn, config).columns(&request.table)?;
    let filter = SearchFilter::build(&column_names(&columns), &request.query)?;
    let order = resolve_order(conn, config, request, &columns, &filter)?;
    let rows = fetch_rows(conn, config, &request.table, &columns, &filter, &order, None)?;
    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortDirection;
    use crate::test_fixtures::fixture_connection;

    fn amounts(page: &TablePage) -> Vec<String> {
        page.rows
            .iter()
            .map(|r| r.get("Importe").map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_page_reports_totals() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = TableRequest::new("obras_contratos_menores").with_page_size(2);
        let page = load_page(&conn, &config, &request).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.columns.len(), 6);
    }

    #[test]
    fn test_numeric_sort_uses_parsed_values() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = TableRequest::new("obras_contratos_menores")
            .with_sort(SortSpec::by("Importe", SortDirection::Desc));
        let page = load_page(&conn, &config, &request).unwrap();
        assert_eq!(
            amounts(&page),
            vec!["10.000,00", "2.500,00", "1.234,50", "999,00", "150,75"]
        );
        assert_eq!(page.sort_style, NumericStyle::ThousandsDotDecimalComma);
    }

    #[test]
    fn test_filter_then_paginate() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = TableRequest::new("obras_contratos_menores")
            .with_query("álvarez")
            .with_sort(SortSpec::by("Importe", SortDirection::Asc))
            .with_page(5);
        let page = load_page(&conn, &config, &request).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 1);
        assert_eq!(amounts(&page), vec!["999,00", "10.000,00"]);
    }

    #[test]
    fn test_empty_result_is_single_empty_page() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = TableRequest::new("mixed").with_query("zzz-no-match");
        let page = load_page(&conn, &config, &request).unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 1);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_unknown_table_is_metadata_error() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let err = load_page(&conn, &config, &TableRequest::new("missing")).unwrap_err();
        assert!(err.is_metadata());
    }

    #[test]
    fn test_sort_on_unknown_column_fails() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = TableRequest::new("obras_contratos_menores")
            .with_sort(SortSpec::by("NoSuchColumn", SortDirection::Desc));

        let err = load_page(&conn, &config, &request).unwrap_err();
        assert!(matches!(
            err,
            TabulaError::ColumnNotFound { ref column, .. } if column == "NoSuchColumn"
        ));
        assert!(load_all(&conn, &config, &request).is_err());
    }

    #[test]
    fn test_sort_column_matches_case_insensitively() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = TableRequest::new("obras_contratos_menores")
            .with_sort(SortSpec::by("importe", SortDirection::Desc));
        let page = load_page(&conn, &config, &request).unwrap();
        assert_eq!(amounts(&page)[0], "10.000,00");
    }

    #[test]
    fn test_load_all_ignores_pagination() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = TableRequest::new("mixed").with_page_size(1).with_page(2);
        let (columns, rows) = load_all(&conn, &config, &request).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(rows.len(), 6);
    }
}
