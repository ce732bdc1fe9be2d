//! Value-frequency histograms for one column.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::log_query;
use crate::numeric::{format_locale_number, NumericStyle, StyleDetector};
use crate::query::{sort_key_expression, SearchFilter, SortDirection};
use crate::schema::{column_names, Schema};
use crate::security::SqlSecurity;
use crate::store::Value;

/// What to histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramRequest {
    pub table: String,
    pub column: String,
    #[serde(default)]
    pub query: String,
    /// Falls back to the configured histogram limit
    #[serde(default)]
    pub limit: Option<usize>,
    /// Order of numeric buckets, and of text buckets when not ranking by count
    #[serde(default)]
    pub direction: SortDirection,
    /// Text buckets: most frequent first instead of by value
    #[serde(default = "default_rank_by_count")]
    pub rank_by_count: bool,
}

fn default_rank_by_count() -> bool {
    true
}

impl HistogramRequest {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            query: String::new(),
            limit: None,
            direction: SortDirection::Asc,
            rank_by_count: true,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn ranked_by_value(mut self) -> Self {
        self.rank_by_count = false;
        self
    }
}

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramEntry {
    pub label: String,
    pub count: u64,
    /// Sum of the parsed values in a numeric bucket; `None` for text buckets
    pub sum: Option<f64>,
}

/// Histogram outcome. A failed or empty computation is `NoData`, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HistogramResult {
    Data {
        column: String,
        style: NumericStyle,
        entries: Vec<HistogramEntry>,
    },
    NoData {
        reason: String,
    },
}

impl HistogramResult {
    pub fn no_data(reason: impl Into<String>) -> Self {
        Self::NoData {
            reason: reason.into(),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }

    pub fn entries(&self) -> &[HistogramEntry] {
        match self {
            Self::Data { entries, .. } => entries,
            Self::NoData { .. } => &[],
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries().iter().map(|e| e.label.as_str()).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.entries().iter().map(|e| e.count).collect()
    }

    pub fn sums(&self) -> Vec<Option<f64>> {
        self.entries().iter().map(|e| e.sum).collect()
    }
}

/// Computes histograms against one connection.
pub struct HistogramAnalyzer<'a> {
    config: &'a EngineConfig,
    detector: StyleDetector,
}

impl<'a> HistogramAnalyzer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            detector: StyleDetector::new(config.sample_size),
        }
    }

    /// Computes the histogram for `request`.
    ///
    /// Metadata failures (unknown table) are returned as errors; anything that goes
    /// wrong afterwards yields [`HistogramResult::NoData`].
    #[instrument(skip(self, conn), fields(table = %request.table, column = %request.column))]
    pub fn compute(&self, conn: &Connection, request: &HistogramRequest) -> Result<HistogramResult> {
        let columns = Schema::new(conn, self.config).columns(&request.table)?;
        if !columns
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&request.column))
        {
            return Ok(HistogramResult::no_data(format!(
                "column '{}' not found",
                request.column
            )));
        }
        let filter = SearchFilter::build(&column_names(&columns), &request.query)?;

        match self.buckets(conn, request, &filter) {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(error = %e, "histogram query failed");
                Ok(HistogramResult::no_data(e.to_string()))
            }
        }
    }

    fn buckets(
        &self,
        conn: &Connection,
        request: &HistogramRequest,
        filter: &SearchFilter,
    ) -> Result<HistogramResult> {
        let style = self
            .detector
            .detect(conn, &request.table, &request.column, filter);
        let tbl = SqlSecurity::quote_identifier(&request.table)?;
        let limit = request.limit.unwrap_or(self.config.histogram_limit).max(1);
        let direction = request.direction.as_sql();

        // Numeric buckets are rounded to the two decimals their labels show
        let sql = if style.is_numeric() {
            let key = sort_key_expression(&request.column, style)?;
            format!(
                "SELECT ROUND(k, 2) AS b, COUNT(*), SUM(k) FROM (SELECT {key} AS k FROM {tbl} {}) \
                 WHERE k IS NOT NULL GROUP BY b ORDER BY b {direction} LIMIT {limit}",
                filter.where_clause()
            )
        } else {
            let col = SqlSecurity::quote_identifier(&request.column)?;
            let order = if request.rank_by_count {
                format!("COUNT(*) DESC, {col} ASC")
            } else {
                format!("{col} {direction}")
            };
            format!(
                "SELECT {col}, COUNT(*), NULL FROM {tbl} {} GROUP BY {col} ORDER BY {order} LIMIT {limit}",
                filter.where_clause()
            )
        };
        log_query!(self.config.log, &sql);

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(filter.params(), |row| {
                let key = Value::from(row.get_ref(0)?);
                let count: i64 = row.get(1)?;
                let sum: Option<f64> = row.get(2)?;
                Ok((key, count, sum))
            })?
            .map(|item| {
                item.map(|(key, count, sum)| HistogramEntry {
                    label: match (&key, style.is_numeric()) {
                        (Value::Real(v), true) => format_locale_number(*v),
                        (Value::Integer(v), true) => format_locale_number(*v as f64),
                        _ => key.to_string(),
                    },
                    count: u64::try_from(count).unwrap_or_default(),
                    sum,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if entries.is_empty() {
            return Ok(HistogramResult::no_data("no values"));
        }
        Ok(HistogramResult::Data {
            column: request.column.clone(),
            style,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::fixture_connection;

    #[test]
    fn test_numeric_histogram_is_ordered_by_value() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let result = HistogramAnalyzer::new(&config)
            .compute(
                &conn,
                &HistogramRequest::new("obras_contratos_menores", "Importe"),
            )
            .unwrap();
        assert_eq!(
            result.labels(),
            vec!["150,75", "999,00", "1.234,50", "2.500,00", "10.000,00"]
        );
        assert_eq!(result.counts(), vec![1, 1, 1, 1, 1]);
        assert_eq!(result.sums()[0], Some(150.75));
    }

    #[test]
    fn test_numeric_buckets_share_rounded_label() {
        let conn = fixture_connection();
        conn.execute_batch(
            "CREATE TABLE prezos (valor TEXT);
             INSERT INTO prezos VALUES ('1,001'), ('1,004'), ('2,00');",
        )
        .unwrap();
        let config = EngineConfig::default();
        let result = HistogramAnalyzer::new(&config)
            .compute(&conn, &HistogramRequest::new("prezos", "valor"))
            .unwrap();
        assert_eq!(result.labels(), vec!["1,00", "2,00"]);
        assert_eq!(result.counts(), vec![2, 1]);
        let sum = result.sums()[0].unwrap();
        assert!((sum - 2.005).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_histogram_descending_with_limit() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = HistogramRequest::new("obras_contratos_menores", "Importe")
            .with_direction(SortDirection::Desc)
            .with_limit(2);
        let result = HistogramAnalyzer::new(&config).compute(&conn, &request).unwrap();
        assert_eq!(result.labels(), vec!["10.000,00", "2.500,00"]);
    }

    #[test]
    fn test_text_histogram_ranked_by_count() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let result = HistogramAnalyzer::new(&config)
            .compute(&conn, &HistogramRequest::new("obras_contratos_menores", "Tipo"))
            .unwrap();
        assert_eq!(result.entries()[0].label, "Obras");
        assert_eq!(result.entries()[0].count, 3);
        assert_eq!(result.counts().iter().sum::<u64>(), 5);
        assert!(result.sums().iter().all(Option::is_none));
    }

    #[test]
    fn test_text_histogram_ranked_by_value() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = HistogramRequest::new("obras_contratos_menores", "Tipo")
            .ranked_by_value()
            .with_direction(SortDirection::Desc);
        let result = HistogramAnalyzer::new(&config).compute(&conn, &request).unwrap();
        assert_eq!(result.labels(), vec!["Servizos", "Obras", ""]);
    }

    #[test]
    fn test_histogram_respects_filter() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = HistogramRequest::new("obras_contratos_menores", "Tipo").with_query("alvarez");
        let result = HistogramAnalyzer::new(&config).compute(&conn, &request).unwrap();
        assert_eq!(result.counts().iter().sum::<u64>(), 2);
    }

    #[test]
    fn test_empty_filter_result_is_no_data() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let request = HistogramRequest::new("mixed", "valor").with_query("nothing-matches-this");
        let result = HistogramAnalyzer::new(&config).compute(&conn, &request).unwrap();
        assert!(result.is_no_data());
        assert!(result.entries().is_empty());
    }

    #[test]
    fn test_unknown_column_is_no_data() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        let result = HistogramAnalyzer::new(&config)
            .compute(&conn, &HistogramRequest::new("mixed", "ghost"))
            .unwrap();
        assert!(result.is_no_data());
    }

    #[test]
    fn test_unknown_table_is_error() {
        let conn = fixture_connection();
        let config = EngineConfig::default();
        assert!(HistogramAnalyzer::new(&config)
            .compute(&conn, &HistogramRequest::new("ghost", "x"))
            .is_err());
    }
}
