//! Pure merge of per-table summaries into cross-table series.
//!
//! [`merge_summaries`] is a fold over immutable [`TableSummary`] partials. It does
//! not care in which order the partials were computed: they are sorted by table
//! name first, and every ranking breaks ties by label.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use super::summary::{descending, AttachmentCoverage, TableSummary, TopRecord};
use crate::config::EngineConfig;

/// One table's values along a series' label axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack<T> {
    pub table: String,
    pub values: Vec<T>,
}

/// A global ranking plus per-table stacks aligned to the same labels.
///
/// Every stack has one value per label; tables without a label get zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedSeries<T> {
    pub labels: Vec<String>,
    pub totals: Vec<T>,
    pub stacks: Vec<Stack<T>>,
}

impl<T> Default for StackedSeries<T> {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            totals: Vec::new(),
            stacks: Vec::new(),
        }
    }
}

impl<T: Copy> StackedSeries<T> {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The global total for `label`.
    pub fn total_of(&self, label: &str) -> Option<T> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.totals[i])
    }

    /// The stack contributed by `table`.
    pub fn stack_of(&self, table: &str) -> Option<&[T]> {
        self.stacks
            .iter()
            .find(|s| s.table == table)
            .map(|s| s.values.as_slice())
    }
}

/// Result of a cross-table (or single-table) summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTableAggregate {
    pub query: String,
    /// Tables that contributed, sorted by name
    pub tables: Vec<String>,
    pub total_rows: u64,
    pub type_counts: StackedSeries<u64>,
    pub type_sums: StackedSeries<f64>,
    pub awardees: StackedSeries<u64>,
    pub monthly_counts: StackedSeries<u64>,
    pub monthly_sums: StackedSeries<f64>,
    pub top_records: Vec<TopRecord>,
    pub attachments: AttachmentCoverage,
}

/// Size limits applied by the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeLimits {
    pub awardees: usize,
    pub top_records: usize,
}

impl From<&EngineConfig> for MergeLimits {
    fn from(config: &EngineConfig) -> Self {
        Self {
            awardees: config.awardees_global,
            top_records: config.top_records,
        }
    }
}

/// Merges per-table partials into global rankings and aligned stacks.
///
/// ```rust
/// use tabula::analyzers::{merge_summaries, AwardeeCount, MergeLimits, TableSummary};
///
/// let acme = |count| AwardeeCount { key: "acme".into(), display: "Acme".into(), count };
/// let mut a = TableSummary::new("A");
/// a.awardees = vec![acme(3)];
/// let mut b = TableSummary::new("B");
/// b.awardees = vec![
///     acme(2),
///     AwardeeCount { key: "beta".into(), display: "Beta".into(), count: 1 },
/// ];
///
/// let merged = merge_summaries("", vec![b, a], MergeLimits { awardees: 10, top_records: 20 });
/// assert_eq!(merged.awardees.labels, vec!["Acme", "Beta"]);
/// assert_eq!(merged.awardees.totals, vec![5, 1]);
/// assert_eq!(merged.awardees.stack_of("A"), Some(&[3, 0][..]));
/// assert_eq!(merged.awardees.stack_of("B"), Some(&[2, 1][..]));
/// ```
pub fn merge_summaries(
    query: &str,
    mut partials: Vec<TableSummary>,
    limits: MergeLimits,
) -> CrossTableAggregate {
    partials.sort_by(|a, b| a.table.cmp(&b.table));

    let type_counts = Contribution::collect(&partials, |p| {
        p.type_counts
            .iter()
            .map(|e| (e.label.clone(), e.label.clone(), e.count))
            .collect()
    });
    let type_sums = Contribution::collect(&partials, |p| {
        p.type_sums
            .iter()
            .map(|e| (e.label.clone(), e.label.clone(), e.amount))
            .collect()
    });
    let awardees = Contribution::collect(&partials, |p| {
        p.awardees
            .iter()
            .map(|a| (a.key.clone(), a.display.clone(), a.count))
            .collect()
    });
    let monthly_counts = Contribution::collect(&partials, |p| {
        p.monthly
            .iter()
            .map(|m| (m.month.clone(), m.month.clone(), m.count))
            .collect()
    });
    let monthly_sums = Contribution::collect(&partials, |p| {
        p.monthly
            .iter()
            .filter_map(|m| m.amount.map(|a| (m.month.clone(), m.month.clone(), a)))
            .collect()
    });

    let month_axis = rank(&monthly_counts, Ranking::KeyAscending, None);
    let monthly_counts = align(&month_axis, &monthly_counts);
    let monthly_sums = align(&month_axis, &monthly_sums);

    let mut top_records: Vec<TopRecord> = partials
        .iter()
        .flat_map(|p| p.top_records.iter().cloned())
        .collect();
    top_records.sort_by(|a, b| {
        descending(a.amount, b.amount)
            .then_with(|| a.table.cmp(&b.table))
            .then_with(|| a.label.cmp(&b.label))
    });
    top_records.truncate(limits.top_records);

    let mut attachments = AttachmentCoverage::default();
    for coverage in partials.iter().filter_map(|p| p.attachments) {
        attachments += coverage;
    }

    CrossTableAggregate {
        query: query.trim().to_string(),
        tables: partials.iter().map(|p| p.table.clone()).collect(),
        total_rows: partials.iter().map(|p| p.total_rows).sum(),
        type_counts: combine(&type_counts, Ranking::ValueDescending, None),
        type_sums: combine(&type_sums, Ranking::ValueDescending, None),
        awardees: combine(&awardees, Ranking::ValueDescending, Some(limits.awardees)),
        monthly_counts,
        monthly_sums,
        top_records,
        attachments,
    }
}

/// Values that can be summed and ranked.
trait Metric: Copy + Default + PartialOrd + AddAssign {}

impl Metric for u64 {}
impl Metric for f64 {}

/// One table's `(key, display, value)` entries for a metric.
struct Contribution<T> {
    table: String,
    entries: Vec<(String, String, T)>,
}

impl<T: Metric> Contribution<T> {
    /// Extracts a metric from every partial, dropping tables that lack it.
    fn collect(
        partials: &[TableSummary],
        extract: impl Fn(&TableSummary) -> Vec<(String, String, T)>,
    ) -> Vec<Self> {
        partials
            .iter()
            .map(|p| Self {
                table: p.table.clone(),
                entries: extract(p),
            })
            .filter(|c| !c.entries.is_empty())
            .collect()
    }

    fn values_by_key(&self) -> HashMap<&str, T> {
        let mut values: HashMap<&str, T> = HashMap::new();
        for (key, _, value) in &self.entries {
            *values.entry(key.as_str()).or_default() += *value;
        }
        values
    }
}

#[derive(Debug, Clone, Copy)]
enum Ranking {
    /// Largest total first, ties by display label
    ValueDescending,
    /// By key, for chronological axes
    KeyAscending,
}

/// A label on a series axis.
struct AxisLabel {
    key: String,
    display: String,
}

/// Global ranking of keys; the display label is the first one seen in table order.
fn rank<T: Metric>(
    contributions: &[Contribution<T>],
    ranking: Ranking,
    limit: Option<usize>,
) -> Vec<AxisLabel> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut ranked: Vec<(&str, &str, T)> = Vec::new();
    for contribution in contributions {
        for (key, display, value) in &contribution.entries {
            match index.get(key.as_str()) {
                Some(&i) => ranked[i].2 += *value,
                None => {
                    index.insert(key.as_str(), ranked.len());
                    ranked.push((key.as_str(), display.as_str(), *value));
                }
            }
        }
    }

    match ranking {
        Ranking::ValueDescending => ranked.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        }),
        Ranking::KeyAscending => ranked.sort_by(|a, b| a.0.cmp(b.0)),
    }
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }

    ranked
        .into_iter()
        .map(|(key, display, _)| AxisLabel {
            key: key.to_string(),
            display: display.to_string(),
        })
        .collect()
}

/// Builds totals and zero-filled stacks for `axis`.
fn align<T: Metric>(axis: &[AxisLabel], contributions: &[Contribution<T>]) -> StackedSeries<T> {
    let mut totals = vec![T::default(); axis.len()];
    let mut stacks = Vec::with_capacity(contributions.len());
    for contribution in contributions {
        let by_key = contribution.values_by_key();
        let values: Vec<T> = axis
            .iter()
            .map(|label| by_key.get(label.key.as_str()).copied().unwrap_or_default())
            .collect();
        for (total, value) in totals.iter_mut().zip(&values) {
            *total += *value;
        }
        stacks.push(Stack {
            table: contribution.table.clone(),
            values,
        });
    }

    StackedSeries {
        labels: axis.iter().map(|label| label.display.clone()).collect(),
        totals,
        stacks,
    }
}

fn combine<T: Metric>(
    contributions: &[Contribution<T>],
    ranking: Ranking,
    limit: Option<usize>,
) -> StackedSeries<T> {
    align(&rank(contributions, ranking, limit), contributions)
}
