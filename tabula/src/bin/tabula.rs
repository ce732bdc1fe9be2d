//! Command-line front end for exploring a SQLite dataset.
//!
//! Every command prints JSON on stdout; logs go to stderr.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tabula::analyzers::HistogramRequest;
use tabula::config::EngineConfig;
use tabula::engine::Explorer;
use tabula::export::export_file_name;
use tabula::logging::setup::{init_logging, LoggingConfig};
use tabula::logging::LogConfig;
use tabula::query::{SortDirection, SortSpec, TableRequest};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite dataset to open read-only
    #[arg(long, env = "TABULA_DB")]
    db: PathBuf,

    /// JSON engine configuration; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Debug logging, including generated SQL
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tables
    Tables {
        /// Include attachment tables
        #[arg(long)]
        all: bool,
    },
    /// List the columns of a table
    Columns { table: String },
    /// Show one page of a table
    Page {
        table: String,
        #[command(flatten)]
        view: ViewArgs,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Value histogram of one column
    Histogram {
        table: String,
        column: String,
        #[arg(long, short, default_value = "")]
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Descending bucket order
        #[arg(long)]
        desc: bool,
        /// Order text buckets by value instead of frequency
        #[arg(long)]
        by_value: bool,
    },
    /// Summary dashboard across all base tables, or one table
    Summary {
        #[arg(long)]
        table: Option<String>,
        #[arg(long, short, default_value = "")]
        query: String,
    },
    /// Export the filtered, sorted view of a table as CSV
    Export {
        table: String,
        #[command(flatten)]
        view: ViewArgs,
        /// Output file; defaults to `_<table>_export.csv`, `-` for stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Accent- and case-insensitive search over every column
    #[arg(long, short, default_value = "")]
    query: String,
    /// Column to sort by
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl ViewArgs {
    fn request(self, table: String) -> TableRequest {
        let sort = match self.sort {
            Some(column) => SortSpec::by(column, SortDirection::from_descending(self.desc)),
            None => SortSpec::natural(),
        };
        TableRequest::new(table).with_query(self.query).with_sort(sort)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(LoggingConfig::for_verbosity(cli.verbose).with_json_format(cli.json_logs))?;

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if cli.verbose {
        config.log = LogConfig::verbose();
    }

    let explorer = Explorer::open(&cli.db, config)?;

    match cli.command {
        Command::Tables { all } => {
            let tables = if all {
                explorer.list_tables().await?
            } else {
                explorer.list_base_tables().await?
            };
            print_json(&tables)?;
        }
        Command::Columns { table } => {
            print_json(&explorer.columns(&table).await?)?;
        }
        Command::Page {
            table,
            view,
            page,
            page_size,
        } => {
            let mut request = view.request(table).with_page(page);
            request.page_size = page_size;
            print_json(&explorer.table_page(request).await?)?;
        }
        Command::Histogram {
            table,
            column,
            query,
            limit,
            desc,
            by_value,
        } => {
            let mut request = HistogramRequest::new(table, column)
                .with_query(query)
                .with_direction(SortDirection::from_descending(desc));
            request.limit = limit;
            if by_value {
                request = request.ranked_by_value();
            }
            print_json(&explorer.histogram(request).await?)?;
        }
        Command::Summary { table, query } => {
            let aggregate = match table {
                Some(table) => explorer.summarize_table(&table, &query).await?,
                None => explorer.summarize_all(&query).await?,
            };
            print_json(&aggregate)?;
        }
        Command::Export { table, view, out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(export_file_name(&table)));
            let request = view.request(table);
            let written = if out.as_os_str() == "-" {
                explorer.export_csv(request, io::stdout().lock()).await?
            } else {
                let file = BufWriter::new(File::create(&out)?);
                explorer.export_csv(request, file).await?
            };
            tracing::info!(rows = written, path = %out.display(), "export finished");
        }
    }

    Ok(())
}
