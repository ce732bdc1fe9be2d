//! # Tabula - schema-agnostic exploration of SQLite datasets
//!
//! Tabula opens a SQLite file read-only and serves filtered, sorted, paginated
//! views of any table, column histograms, and a summary dashboard that merges
//! per-table aggregates into global rankings with per-table stacks. It knows
//! nothing about the tables in advance: columns are discovered at runtime and the
//! roles they play (record type, amount, awardee, ...) come from configurable
//! candidate lists.
//!
//! ## Locale-aware numbers
//!
//! Amounts in the datasets Tabula targets are stored as text, usually written as
//! `12.345,67`. Before a column is sorted, bucketed or summed, a sample of its
//! values (restricted to the active search) decides whether it holds euro-style
//! numbers, plain dot-decimals, or neither; numeric columns are then handled via
//! the `locale_number` SQL function so `9,50` sorts before `10,00`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabula::prelude::*;
//!
//! # async fn example() -> tabula::error::Result<()> {
//! let explorer = Explorer::open("contratos.db", EngineConfig::default())?;
//!
//! for table in explorer.list_base_tables().await? {
//!     println!("{table}");
//! }
//!
//! let page = explorer
//!     .table_page(
//!         TableRequest::new("obras_contratos_menores")
//!             .with_query("alvarez")
//!             .with_sort(SortSpec::by("Importe", SortDirection::Desc)),
//!     )
//!     .await?;
//! println!("page {}/{} ({} rows)", page.page, page.pages, page.total);
//!
//! let histogram = explorer
//!     .histogram(HistogramRequest::new("obras_contratos_menores", "Tipo"))
//!     .await?;
//! println!("{:?}", histogram.labels());
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The library emits `tracing` events and never installs a subscriber. Binaries
//! can use [`logging::setup::init_logging`]; SQL statement logging is switched on
//! through [`logging::LogConfig::log_queries`].

pub mod analyzers;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod logging;
pub mod numeric;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod security;
pub mod store;
pub mod text;

#[cfg(test)]
pub(crate) mod test_fixtures;
