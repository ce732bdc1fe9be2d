//! Per-table summary aggregation.
//!
//! A [`TableSummary`] is an immutable partial: everything the cross-table
//! dashboard needs from one table, computed under the active search filter.
//! Partials are combined by [`merge_summaries`](super::merge_summaries).

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::TableRoles;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::numeric::{NumericStyle, StyleDetector};
use crate::query::{count_rows, sort_key_expression, SearchFilter};
use crate::schema::{column_names, pick_first_column, Schema};
use crate::security::SqlSecurity;
use crate::store::Value;
use crate::text::fold;
use crate::{log_query, log_table_progress};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledCount {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledAmount {
    pub label: String,
    pub amount: f64,
}

/// Awardee occurrences grouped by folded name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardeeCount {
    /// Case- and accent-folded name; empty for blank awardees
    pub key: String,
    /// First non-blank spelling seen
    pub display: String,
    pub count: u64,
}

/// Records per `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: String,
    pub count: u64,
    /// Sum of parsed amounts; absent when the table has no numeric amount column
    pub amount: Option<f64>,
}

/// A high-amount record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRecord {
    pub table: String,
    pub label: String,
    pub amount: f64,
    pub record_id: Option<String>,
    pub description: Option<String>,
}

/// Records with and without at least one attachment row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentCoverage {
    pub with_attachments: u64,
    pub without_attachments: u64,
}

impl AttachmentCoverage {
    pub fn total(&self) -> u64 {
        self.with_attachments + self.without_attachments
    }
}

impl std::ops::AddAssign for AttachmentCoverage {
    fn add_assign(&mut self, rhs: Self) {
        self.with_attachments += rhs.with_attachments;
        self.without_attachments += rhs.without_attachments;
    }
}

/// Everything one table contributes to a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: String,
    pub total_rows: u64,
    pub amount_style: NumericStyle,
    /// Count per record type, most frequent first
    pub type_counts: Vec<LabeledCount>,
    /// Amount per record type, largest first; empty without a numeric amount
    pub type_sums: Vec<LabeledAmount>,
    /// Most frequent awardees, at most `awardees_per_table`
    pub awardees: Vec<AwardeeCount>,
    /// Month buckets in ascending order
    pub monthly: Vec<MonthlyBucket>,
    /// Highest amounts, at most `top_records`
    pub top_records: Vec<TopRecord>,
    /// Present only when the table has an attachment table
    pub attachments: Option<AttachmentCoverage>,
}

impl TableSummary {
    /// A summary with no rows and no metrics.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            total_rows: 0,
            amount_style: NumericStyle::None,
            type_counts: Vec::new(),
            type_sums: Vec::new(),
            awardees: Vec::new(),
            monthly: Vec::new(),
            top_records: Vec::new(),
            attachments: None,
        }
    }
}

/// Orders floats descending, treating incomparable values as equal.
pub(crate) fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Truncates `label` to `max_chars` characters, appending `ellipsis` when cut.
pub fn truncate_label(label: &str, max_chars: usize, ellipsis: &str) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut cut: String = label.chars().take(max_chars).collect();
    cut.push_str(ellipsis);
    cut
}

/// Turns the `YYYY-MM` key derived from a `...DD/MM/YYYY` string into a month,
/// rejecting keys that are not a real calendar month.
pub(crate) fn valid_month(key: &str) -> Option<String> {
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%Y-%m").to_string())
}

/// Computes [`TableSummary`] partials.
pub struct TableSummarizer<'a> {
    config: &'a EngineConfig,
    detector: StyleDetector,
}

impl<'a> TableSummarizer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            detector: StyleDetector::new(config.sample_size),
        }
    }

    /// Summarizes `table` over the rows matching `query`.
    #[instrument(skip(self, conn))]
    pub fn summarize(&self, conn: &Connection, table: &str, query: &str) -> Result<TableSummary> {
        let schema = Schema::new(conn, self.config);
        let columns = schema.columns(table)?;
        let filter = SearchFilter::build(&column_names(&columns), query)?;
        let roles = TableRoles::resolve(self.config, table, &columns);

        let mut summary = TableSummary::new(table);
        summary.total_rows = count_rows(conn, self.config, table, &filter)? as u64;

        if let Some(amount) = roles.amount.as_deref() {
            summary.amount_style = self.detector.detect(conn, table, amount, &filter);
        }
        let amount_expr = match roles.amount.as_deref() {
            Some(amount) if summary.amount_style.is_numeric() => {
                Some(sort_key_expression(amount, summary.amount_style)?)
            }
            _ => None,
        };

        let scope = Scope {
            conn,
            table,
            tbl: SqlSecurity::quote_identifier(table)?,
            filter: &filter,
            amount_expr: amount_expr.as_deref(),
        };

        if let Some(column) = roles.record_type.as_deref() {
            let (counts, sums) = self.types(&scope, column)?;
            summary.type_counts = counts;
            summary.type_sums = sums;
        }
        if let Some(column) = roles.awardee.as_deref() {
            summary.awardees = self.awardees(&scope, column)?;
        }
        if let Some(column) = roles.date.as_deref() {
            summary.monthly = self.monthly(&scope, column)?;
        }
        if amount_expr.is_some() {
            summary.top_records = self.top_records(&scope, &roles)?;
        }
        if let Some(record_id) = roles.record_id.as_deref() {
            summary.attachments = self.attachments(&scope, &schema, record_id)?;
        }

        log_table_progress!(
            self.config.log,
            table = %table,
            rows = summary.total_rows,
            "table summarized"
        );
        Ok(summary)
    }

    fn types(
        &self,
        scope: &Scope<'_>,
        column: &str,
    ) -> Result<(Vec<LabeledCount>, Vec<LabeledAmount>)> {
        let col = SqlSecurity::quote_identifier(column)?;
        let sum = scope
            .amount_expr
            .map(|expr| format!("SUM({expr})"))
            .unwrap_or_else(|| "NULL".to_string());
        let sql = format!(
            "SELECT TRIM(CAST({col} AS TEXT)) AS k, COUNT(*), {sum} FROM {} {} GROUP BY k",
            scope.tbl,
            scope.filter.where_clause()
        );
        log_query!(self.config.log, &sql);

        // NULL and '' group separately in SQL but share the blank label
        let mut order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, (u64, f64)> = HashMap::new();
        let mut stmt = scope.conn.prepare(&sql)?;
        let rows = stmt.query_map(scope.filter.params(), |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?;
        for row in rows {
            let (key, count, amount) = row?;
            let label = key
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| self.config.blank_type_label.clone());
            let entry = totals.entry(label.clone()).or_insert_with(|| {
                order.push(label);
                (0, 0.0)
            });
            entry.0 += u64::try_from(count).unwrap_or_default();
            entry.1 += amount.unwrap_or_default();
        }

        let mut counts: Vec<LabeledCount> = order
            .iter()
            .map(|label| LabeledCount {
                label: label.clone(),
                count: totals[label].0,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        let mut sums: Vec<LabeledAmount> = Vec::new();
        if scope.amount_expr.is_some() {
            sums = order
                .iter()
                .map(|label| LabeledAmount {
                    label: label.clone(),
                    amount: totals[label].1,
                })
                .collect();
            sums.sort_by(|a, b| descending(a.amount, b.amount).then_with(|| a.label.cmp(&b.label)));
        }
        Ok((counts, sums))
    }

    fn awardees(&self, scope: &Scope<'_>, column: &str) -> Result<Vec<AwardeeCount>> {
        let col = SqlSecurity::quote_identifier(column)?;
        let sql = format!(
            "SELECT TRIM(CAST({col} AS TEXT)) FROM {} {}",
            scope.tbl,
            scope.filter.where_clause()
        );
        log_query!(self.config.log, &sql);

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut awardees: Vec<AwardeeCount> = Vec::new();
        let mut stmt = scope.conn.prepare(&sql)?;
        let rows = stmt.query_map(scope.filter.params(), |row| row.get::<_, Option<String>>(0))?;
        for row in rows {
            let raw = row?.unwrap_or_default();
            let key = fold(&raw);
            match index.get(&key) {
                Some(&i) => awardees[i].count += 1,
                None => {
                    index.insert(key.clone(), awardees.len());
                    let display = if raw.is_empty() {
                        self.config.blank_awardee_label.clone()
                    } else {
                        raw
                    };
                    awardees.push(AwardeeCount {
                        key,
                        display,
                        count: 1,
                    });
                }
            }
        }

        awardees.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        awardees.truncate(self.config.awardees_per_table);
        Ok(awardees)
    }

    fn monthly(&self, scope: &Scope<'_>, column: &str) -> Result<Vec<MonthlyBucket>> {
        let col = SqlSecurity::quote_identifier(column)?;
        let date = format!("TRIM(CAST({col} AS TEXT))");
        let sum = scope
            .amount_expr
            .map(|expr| format!("SUM({expr})"))
            .unwrap_or_else(|| "NULL".to_string());
        let sql = format!(
            "SELECT SUBSTR({date}, -4, 4) || '-' || SUBSTR({date}, -7, 2) AS ym, COUNT(*), {sum} \
             FROM {} {} GROUP BY ym ORDER BY ym",
            scope.tbl,
            scope.filter.where_clause()
        );
        log_query!(self.config.log, &sql);

        let has_amount = scope.amount_expr.is_some();
        let mut stmt = scope.conn.prepare(&sql)?;
        let rows = stmt.query_map(scope.filter.params(), |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?;

        let mut buckets = Vec::new();
        for row in rows {
            let (key, count, amount) = row?;
            let Some(month) = key.as_deref().and_then(valid_month) else {
                continue;
            };
            buckets.push(MonthlyBucket {
                month,
                count: u64::try_from(count).unwrap_or_default(),
                amount: has_amount.then(|| amount.unwrap_or_default()),
            });
        }
        Ok(buckets)
    }

    fn top_records(&self, scope: &Scope<'_>, roles: &TableRoles) -> Result<Vec<TopRecord>> {
        let Some(amount) = scope.amount_expr else {
            return Ok(Vec::new());
        };
        let column_or_null = |column: Option<&str>| -> Result<String> {
            match column {
                Some(c) => SqlSecurity::quote_identifier(c),
                None => Ok("NULL".to_string()),
            }
        };
        let sql = format!(
            "SELECT {}, {}, {}, {amount} AS amt FROM {} {} ORDER BY amt DESC LIMIT {}",
            column_or_null(roles.record_id.as_deref())?,
            column_or_null(roles.description.as_deref())?,
            column_or_null(roles.awardee.as_deref())?,
            scope.tbl,
            scope.filter.where_with(&format!("{amount} IS NOT NULL")),
            self.config.top_records
        );
        log_query!(self.config.log, &sql);

        let mut stmt = scope.conn.prepare(&sql)?;
        let rows = stmt.query_map(scope.filter.params(), |row| {
            Ok((
                Value::from(row.get_ref(0)?).non_blank_text(),
                Value::from(row.get_ref(1)?).non_blank_text(),
                Value::from(row.get_ref(2)?).non_blank_text(),
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (record_id, description, awardee, amount) = row?;
            let label = description
                .as_deref()
                .or(record_id.as_deref())
                .or(awardee.as_deref())
                .unwrap_or(scope.table);
            records.push(TopRecord {
                table: scope.table.to_string(),
                label: truncate_label(label, self.config.label_max_chars, &self.config.ellipsis),
                amount,
                record_id,
                description,
            });
        }
        Ok(records)
    }

    fn attachments(
        &self,
        scope: &Scope<'_>,
        schema: &Schema<'_>,
        record_id: &str,
    ) -> Result<Option<AttachmentCoverage>> {
        let Some(attachment_table) = schema.find_attachment_table(scope.table)? else {
            return Ok(None);
        };
        let attachment_columns = schema.columns(&attachment_table)?;
        let Some(foreign_id) = pick_first_column(&attachment_columns, &self.config.roles.record_id)
        else {
            return Ok(None);
        };

        let att = SqlSecurity::quote_identifier(&attachment_table)?;
        let fid = SqlSecurity::quote_identifier(foreign_id)?;
        let id = SqlSecurity::quote_identifier(record_id)?;
        let exists = format!(
            "EXISTS (SELECT 1 FROM {att} AS att WHERE att.{fid} = {}.{id})",
            scope.tbl
        );
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN {exists} THEN 1 ELSE 0 END), 0) FROM {} {}",
            scope.tbl,
            scope.filter.where_clause()
        );
        log_query!(self.config.log, &sql);

        let (total, with): (i64, i64) = scope
            .conn
            .query_row(&sql, scope.filter.params(), |row| Ok((row.get(0)?, row.get(1)?)))?;
        let with_attachments = u64::try_from(with).unwrap_or_default();
        Ok(Some(AttachmentCoverage {
            with_attachments,
            without_attachments: u64::try_from(total)
                .unwrap_or_default()
                .saturating_sub(with_attachments),
        }))
    }
}

/// Shared inputs of the per-aggregate queries of one table.
struct Scope<'s> {
    conn: &'s Connection,
    table: &'s str,
    tbl: String,
    filter: &'s SearchFilter,
    amount_expr: Option<&'s str>,
}
