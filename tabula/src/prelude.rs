//! Prelude for commonly used types in tabula.

pub use crate::analyzers::{
    CrossTableAggregate, HistogramRequest, HistogramResult, StackedSeries, TableSummary,
};
pub use crate::config::{ColumnRoles, DateConvention, EngineConfig};
pub use crate::engine::Explorer;
pub use crate::error::{ErrorContext, Result, TabulaError};
pub use crate::logging::LogConfig;
pub use crate::numeric::NumericStyle;
pub use crate::query::{SortDirection, SortSpec, TablePage, TableRequest};
pub use crate::schema::Column;
pub use crate::store::{Row, Value};
