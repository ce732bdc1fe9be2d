//! Aggregations over table contents.
//!
//! - [`HistogramAnalyzer`]: distinct-value frequencies of one column, bucketed by
//!   parsed value for numeric columns.
//! - [`TableSummarizer`]: the per-table partial of the summary dashboard (type
//!   counts and sums, awardees, monthly buckets, top records, attachment coverage).
//! - [`merge_summaries`]: pure fold of partials into global rankings with per-table
//!   stacks aligned to the same labels.
//!
//! Which columns feed each metric is decided per table by [`TableRoles`]; a table
//! lacking a role simply contributes nothing to the metrics that need it.

mod histogram;
mod merge;
mod roles;
mod summary;

pub use histogram::{HistogramAnalyzer, HistogramEntry, HistogramRequest, HistogramResult};
pub use merge::{merge_summaries, CrossTableAggregate, MergeLimits, Stack, StackedSeries};
pub use roles::TableRoles;
pub use summary::{
    truncate_label, AttachmentCoverage, AwardeeCount, LabeledAmount, LabeledCount, MonthlyBucket,
    TableSummarizer, TableSummary, TopRecord,
};
