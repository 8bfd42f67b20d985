//! Statistics dashboard view.
//!
//! Mirrors the summary cards of the web dashboard: a total, up to four
//! numeric columns, the overall missing count, categorical top values and
//! a monthly row count series.

use serde_json::Value;

use super::format::{format_cell, format_decimal, PLACEHOLDER};
use super::Render;
use crate::source::{NumericStat, StatsSnapshot};

/// Maximum number of numeric columns shown as cards.
const MAX_NUMERIC_CARDS: usize = 4;

/// A titled value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub value: String,
}

impl Card {
    fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

/// Top values of one categorical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalView {
    pub column: String,
    /// Distinct value count, or `-`.
    pub unique: String,
    /// `(value, count)` pairs in server order.
    pub top: Vec<(String, u64)>,
}

/// Rendered statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardView {
    pub cards: Vec<Card>,
    pub categorical: Vec<CategoricalView>,
    /// `(period, count)` bars. Empty means the chart is cleared.
    pub timeseries: Vec<(String, u64)>,
}

impl Render for DashboardView {
    type Snapshot = StatsSnapshot;

    fn render(snapshot: &StatsSnapshot) -> Self {
        let stats = &snapshot.stats;
        let mut cards = Vec::with_capacity(MAX_NUMERIC_CARDS + 2);

        cards.push(Card::new(
            "Total",
            stats
                .total_rows
                .map(|n| n.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ));

        for (column, stat) in stats.numeric_stats.iter().take(MAX_NUMERIC_CARDS) {
            cards.push(Card::new(column.clone(), numeric_summary(stat)));
        }

        let missing: u64 = stats.missing_per_column.iter().map(|(_, n)| n).sum();
        cards.push(Card::new("Total ausências", missing.to_string()));

        let categorical = stats
            .categorical_summary
            .iter()
            .map(|item| CategoricalView {
                column: item.column.clone(),
                unique: optional_count(item.unique),
                top: item.top.clone(),
            })
            .collect();

        let timeseries = stats
            .timeseries_monthly
            .iter()
            .map(|point| (point.period.clone(), point.count))
            .collect();

        Self {
            cards,
            categorical,
            timeseries,
        }
    }
}

fn numeric_summary(stat: &NumericStat) -> String {
    if stat.is_identifier() {
        let examples = if stat.examples.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            stat.examples
                .iter()
                .map(format_example)
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "tipo: identificador | únicos: {} | exemplos: {}",
            optional_count(stat.unique),
            examples
        )
    } else {
        format!(
            "média: {} | soma: {} | aus: {}",
            format_decimal(stat.mean),
            format_decimal(stat.sum),
            optional_count(stat.missing)
        )
    }
}

fn format_example(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => format_cell(other),
    }
}

fn optional_count(n: Option<u64>) -> String {
    n.map(|n| n.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
