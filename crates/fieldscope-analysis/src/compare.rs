use std::collections::{BTreeMap, BTreeSet};

use fieldscope_core::{AggregationRow, ComparisonEntry, ComparisonStatus, ReportingWindow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ComparisonSummary {
    pub matched: u32,
    pub delta: u32,
    pub missing: u32,
}

/// Compares every field across the named tables.
///
/// A field is `delta` when two tables hold different non-null values, even
/// if another table lacks it; otherwise `missing` when any table lacks it or
/// holds null; otherwise `match`.
pub fn compare_fields_across_tables(
    tables: &BTreeMap<String, BTreeMap<String, Value>>,
) -> Vec<ComparisonEntry> {
    let fields: BTreeSet<&str> = tables
        .values()
        .flat_map(|table| table.keys().map(String::as_str))
        .collect();

    fields
        .into_iter()
        .map(|field| {
            let values_by_table: BTreeMap<String, Option<Value>> = tables
                .iter()
                .map(|(name, table)| {
                    let value = table.get(field).filter(|value| !value.is_null()).cloned();
                    (name.clone(), value)
                })
                .collect();

            let distinct: BTreeSet<String> = values_by_table
                .values()
                .flatten()
                .map(stringify_value)
                .collect();

            let status = if distinct.len() > 1 {
                ComparisonStatus::Delta
            } else if values_by_table.values().any(Option::is_none) {
                ComparisonStatus::Missing
            } else {
                ComparisonStatus::Match
            };

            ComparisonEntry {
                field: field.to_owned(),
                values_by_table,
                status,
            }
        })
        .collect()
}

/// Presence tables for a row's processed reporting windows, keyed by window
/// label. Fields map to `true`; a processed window without fields is an
/// empty table. Windows that never materialized are left out.
pub fn row_presence_tables(row: &AggregationRow) -> BTreeMap<String, BTreeMap<String, Value>> {
    ReportingWindow::ALL
        .into_iter()
        .filter(|window| row.processed.get(*window))
        .map(|window| {
            let table: BTreeMap<String, Value> = row
                .window(window)
                .into_iter()
                .flatten()
                .map(|field| (field.clone(), Value::Bool(true)))
                .collect();
            (window.label().to_owned(), table)
        })
        .collect()
}

pub fn summarize_comparison(entries: &[ComparisonEntry]) -> ComparisonSummary {
    entries
        .iter()
        .fold(ComparisonSummary::default(), |mut summary, entry| {
            match entry.status {
                ComparisonStatus::Match => summary.matched += 1,
                ComparisonStatus::Delta => summary.delta += 1,
                ComparisonStatus::Missing => summary.missing += 1,
            }
            summary
        })
}

/// Integral floats print as integers so `3` and `3.0` compare equal.
fn stringify_value(value: &Value) -> String {
    const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) if number.is_f64() => match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() < EXACT_INTEGER_LIMIT => {
                format!("{}", float as i64)
            }
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}
