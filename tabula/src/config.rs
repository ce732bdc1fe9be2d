//! Engine configuration.
//!
//! Everything the engine knows about a particular dataset's conventions lives here
//! as data: which column names play which logical role, which table-name suffixes
//! mark attachment tables, and which date column a table family uses. Defaults
//! match the public-procurement datasets Tabula was first written for.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabulaError};
use crate::logging::LogConfig;

/// Ordered candidate column names per logical role.
///
/// Candidates are matched case-insensitively and the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRoles {
    /// Category/type of a record
    pub record_type: Vec<String>,
    /// Monetary amount
    pub amount: Vec<String>,
    /// Awardee / supplier name
    pub awardee: Vec<String>,
    /// Record identifier shared with the attachment table
    pub record_id: Vec<String>,
    /// Free-text description used to label top records
    pub description: Vec<String>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| (*s).to_string()).collect()
        }
        Self {
            record_type: names(&["Tipo", "TipoContrato", "Tipo_licitacion", "Tipo_licitación"]),
            amount: names(&[
                "Importe",
                "Importe_con_iva",
                "Importe_con_IVE",
                "Importe_sin_iva",
                "Importe_sen_IVE",
            ]),
            awardee: names(&[
                "Adxudicatario",
                "Adjudicatario",
                "Proveedor",
                "Contratista",
                "Empresa",
            ]),
            record_id: names(&["Expediente"]),
            description: names(&[
                "Objeto_del_contrato",
                "Objeto_del_Contrato",
                "ObjetoContrato",
                "Obxecto",
                "Objeto",
                "Asunto",
                "Descripcion",
                "Descripción",
                "Concepto",
                "Titulo",
                "Título",
            ]),
        }
    }
}

/// Maps a table-name suffix to the column holding a `DD/MM/YYYY`-terminated date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateConvention {
    /// Case-insensitive table-name suffix
    pub table_suffix: String,
    /// Column whose last ten characters are `DD/MM/YYYY`
    pub date_column: String,
}

impl DateConvention {
    pub fn new(table_suffix: impl Into<String>, date_column: impl Into<String>) -> Self {
        Self {
            table_suffix: table_suffix.into(),
            date_column: date_column.into(),
        }
    }
}

/// Configuration for the query and aggregation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum values sampled by numeric style detection (default: 50)
    pub sample_size: usize,
    /// Page size used when a request does not carry one (default: 50)
    pub default_page_size: usize,
    /// Maximum histogram entries (default: 50)
    pub histogram_limit: usize,
    /// Awardees kept per table before merging (default: 100)
    pub awardees_per_table: usize,
    /// Awardees kept in the merged ranking (default: 10)
    pub awardees_global: usize,
    /// Highest-amount records kept per table and globally (default: 20)
    pub top_records: usize,
    /// Top-record labels longer than this are truncated (default: 50)
    pub label_max_chars: usize,
    /// Marker appended to truncated labels
    pub ellipsis: String,
    /// Attachment-table suffixes in probing priority order
    pub attachment_suffixes: Vec<String>,
    /// Candidate column names per logical role
    pub roles: ColumnRoles,
    /// Table-suffix to date-column conventions, first match wins
    pub date_conventions: Vec<DateConvention>,
    /// Label for records with a blank type
    pub blank_type_label: String,
    /// Label for records with a blank awardee
    pub blank_awardee_label: String,
    /// Whether per-table aggregation may run concurrently
    pub enable_parallel: bool,
    /// Size of the read-only connection pool
    pub max_concurrent_reads: usize,
    /// Optional diagnostics (SQL statements, per-table progress)
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_size: 50,
            default_page_size: 50,
            histogram_limit: 50,
            awardees_per_table: 100,
            awardees_global: 10,
            top_records: 20,
            label_max_chars: 50,
            ellipsis: "…".to_string(),
            attachment_suffixes: vec!["_files".to_string(), "_file".to_string()],
            roles: ColumnRoles::default(),
            date_conventions: vec![
                DateConvention::new("_contratos_menores", "Estado"),
                DateConvention::new("_licitacions", "Fechas"),
            ],
            blank_type_label: "(no type)".to_string(),
            blank_awardee_label: "(unnamed)".to_string(),
            enable_parallel: true,
            max_concurrent_reads: num_cpus::get().clamp(1, 8),
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a builder starting from the defaults.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Loads a JSON document over the defaults. Missing keys keep their default.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every size and limit is usable.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("sample_size", self.sample_size),
            ("default_page_size", self.default_page_size),
            ("histogram_limit", self.histogram_limit),
            ("awardees_per_table", self.awardees_per_table),
            ("awardees_global", self.awardees_global),
            ("top_records", self.top_records),
            ("label_max_chars", self.label_max_chars),
            ("max_concurrent_reads", self.max_concurrent_reads),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(TabulaError::configuration(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        if self.attachment_suffixes.is_empty()
            || self.attachment_suffixes.iter().any(|s| s.is_empty())
        {
            return Err(TabulaError::configuration(
                "attachment_suffixes must list at least one non-empty suffix",
            ));
        }
        Ok(())
    }

    /// Returns true if `table` carries a recognized attachment suffix.
    pub fn is_attachment_table(&self, table: &str) -> bool {
        let lower = table.to_lowercase();
        self.attachment_suffixes
            .iter()
            .any(|suffix| lower.ends_with(&suffix.to_lowercase()))
    }

    /// Returns the date column configured for `table`, if any convention matches.
    pub fn date_column_for(&self, table: &str) -> Option<&str> {
        let lower = table.to_lowercase();
        self.date_conventions
            .iter()
            .find(|c| lower.ends_with(&c.table_suffix.to_lowercase()))
            .map(|c| c.date_column.as_str())
    }
}

/// Builder for [`EngineConfig`].
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the numeric style sample size
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Set the default page size
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.config.default_page_size = size;
        self
    }

    /// Set the histogram entry limit
    pub fn histogram_limit(mut self, limit: usize) -> Self {
        self.config.histogram_limit = limit;
        self
    }

    /// Set the attachment suffixes in priority order
    pub fn attachment_suffixes(mut self, suffixes: Vec<impl Into<String>>) -> Self {
        self.config.attachment_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the role catalog
    pub fn roles(mut self, roles: ColumnRoles) -> Self {
        self.config.roles = roles;
        self
    }

    /// Replace the date conventions
    pub fn date_conventions(mut self, conventions: Vec<DateConvention>) -> Self {
        self.config.date_conventions = conventions;
        self
    }

    /// Enable or disable concurrent per-table aggregation
    pub fn enable_parallel(mut self, enable: bool) -> Self {
        self.config.enable_parallel = enable;
        self
    }

    /// Set the connection pool size
    pub fn max_concurrent_reads(mut self, readers: usize) -> Self {
        self.config.max_concurrent_reads = readers;
        self
    }

    /// Set the logging behaviour
    pub fn log(mut self, log: LogConfig) -> Self {
        self.config.log = log;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
