//! The async entry point tying the dataset, queries and analyzers together.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::analyzers::{
    merge_summaries, CrossTableAggregate, HistogramAnalyzer, HistogramRequest, HistogramResult,
    MergeLimits, TableSummarizer, TableSummary,
};
use crate::config::EngineConfig;
use crate::error::{Result, TabulaError};
use crate::export::write_csv;
use crate::query::{load_all, load_page, TablePage, TableRequest};
use crate::schema::{Column, Schema};
use crate::store::{Dataset, Row};

/// Read-only explorer over one SQLite dataset.
///
/// All methods are async; SQLite work runs on the blocking pool through the
/// dataset's bounded connection pool.
///
/// ```rust,no_run
/// use tabula::prelude::*;
///
/// # async fn run() -> tabula::error::Result<()> {
/// let explorer = Explorer::open("contratos.db", EngineConfig::default())?;
/// let page = explorer
///     .table_page(TableRequest::new("obras_contratos_menores").with_query("álvarez"))
///     .await?;
/// println!("{} of {} rows", page.rows.len(), page.total);
///
/// let dashboard = explorer.summarize_all("").await?;
/// println!("{:?}", dashboard.awardees.labels);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Explorer {
    dataset: Dataset,
    config: Arc<EngineConfig>,
}

impl Explorer {
    /// Opens `path` read-only using `config`.
    pub fn open(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let dataset = Dataset::open(path, config.max_concurrent_reads)?;
        Ok(Self {
            dataset,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Every user table, sorted by name.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let config = Arc::clone(&self.config);
        self.dataset
            .run(move |conn| Schema::new(conn, &config).list_tables())
            .await
    }

    /// Tables that are not attachment tables.
    pub async fn list_base_tables(&self) -> Result<Vec<String>> {
        let config = Arc::clone(&self.config);
        self.dataset
            .run(move |conn| Schema::new(conn, &config).list_base_tables())
            .await
    }

    pub async fn columns(&self, table: &str) -> Result<Vec<Column>> {
        let config = Arc::clone(&self.config);
        let table = table.to_string();
        self.dataset
            .run(move |conn| Schema::new(conn, &config).columns(&table))
            .await
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let config = Arc::clone(&self.config);
        let table = table.to_string();
        self.dataset
            .run(move |conn| Schema::new(conn, &config).table_exists(&table))
            .await
    }

    pub async fn find_attachment_table(&self, base: &str) -> Result<Option<String>> {
        let config = Arc::clone(&self.config);
        let base = base.to_string();
        self.dataset
            .run(move |conn| Schema::new(conn, &config).find_attachment_table(&base))
            .await
    }

    /// One filtered, ordered page of a table.
    #[instrument(skip(self, request), fields(table = %request.table))]
    pub async fn table_page(&self, request: TableRequest) -> Result<TablePage> {
        let start = Instant::now();
        let config = Arc::clone(&self.config);
        let page = self
            .dataset
            .run(move |conn| load_page(conn, &config, &request))
            .await?;
        info!(
            total = page.total,
            page = page.page,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "page served"
        );
        Ok(page)
    }

    /// Histogram of one column. Query failures come back as
    /// [`HistogramResult::NoData`]; only an unknown table is an error.
    pub async fn histogram(&self, request: HistogramRequest) -> Result<HistogramResult> {
        let config = Arc::clone(&self.config);
        self.dataset
            .run(move |conn| HistogramAnalyzer::new(&config).compute(conn, &request))
            .await
    }

    /// Summary dashboard restricted to one table.
    pub async fn summarize_table(&self, table: &str, query: &str) -> Result<CrossTableAggregate> {
        let summary = self.summarize_one(table.to_string(), query.to_string()).await?;
        Ok(merge_summaries(
            query,
            vec![summary],
            MergeLimits::from(self.config.as_ref()),
        ))
    }

    /// Summary dashboard over every base table.
    ///
    /// A table whose aggregation fails is logged and left out; failing to list
    /// the tables is an error.
    #[instrument(skip(self))]
    pub async fn summarize_all(&self, query: &str) -> Result<CrossTableAggregate> {
        let start = Instant::now();
        let tables = self.list_base_tables().await?;
        info!(tables = tables.len(), "summarizing tables");

        let results: Vec<(String, Result<TableSummary>)> = if self.config.enable_parallel {
            let handles: Vec<_> = tables
                .iter()
                .map(|table| {
                    let explorer = self.clone();
                    let table = table.clone();
                    let query = query.to_string();
                    tokio::spawn(async move { explorer.summarize_one(table, query).await })
                })
                .collect();

            join_all(handles)
                .await
                .into_iter()
                .zip(&tables)
                .map(|(joined, table)| {
                    let result = joined
                        .map_err(|e| TabulaError::internal(format!("Task join error: {e}")))
                        .and_then(|r| r);
                    (table.clone(), result)
                })
                .collect()
        } else {
            let mut results = Vec::with_capacity(tables.len());
            for table in &tables {
                let result = self.summarize_one(table.clone(), query.to_string()).await;
                results.push((table.clone(), result));
            }
            results
        };

        let mut partials = Vec::with_capacity(results.len());
        for (table, result) in results {
            match result {
                Ok(summary) => partials.push(summary),
                Err(e) => warn!(table = %table, error = %e, "skipping table in summary"),
            }
        }

        let aggregate = merge_summaries(query, partials, MergeLimits::from(self.config.as_ref()));
        info!(
            tables = aggregate.tables.len(),
            rows = aggregate.total_rows,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "summary finished"
        );
        Ok(aggregate)
    }

    async fn summarize_one(&self, table: String, query: String) -> Result<TableSummary> {
        let config = Arc::clone(&self.config);
        self.dataset
            .run(move |conn| TableSummarizer::new(&config).summarize(conn, &table, &query))
            .await
    }

    /// Every row of a filtered, ordered view; page fields of `request` are ignored.
    pub async fn export_rows(&self, request: TableRequest) -> Result<(Vec<Column>, Vec<Row>)> {
        let config = Arc::clone(&self.config);
        self.dataset
            .run(move |conn| load_all(conn, &config, &request))
            .await
    }

    /// Writes the filtered, ordered view as CSV. Returns the number of rows written.
    pub async fn export_csv<W: Write>(&self, request: TableRequest, writer: W) -> Result<usize> {
        let (columns, rows) = self.export_rows(request).await?;
        write_csv(writer, &columns, &rows)
    }
}
