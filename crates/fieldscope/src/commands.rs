use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use fieldscope_analysis::{
    AuditRequest, build_audit_report, build_namespace_findings, compare_fields_across_tables,
    count_fields_across_apps, map_aggregations_to_rows, row_presence_tables, summarize_comparison,
    summarize_subscriptions,
};
use fieldscope_core::{
    AggregationTree, ComparisonEntry, LabelMap, decode_cached_table, group_rows_by_subscription,
};
use serde_json::Value;

use crate::cli::{CompareArgs, InputArgs, OutputFormat, RowsArgs, WindowsArgs};
use crate::output::{
    write_comparison_table, write_coverage_table, write_findings_table, write_json,
    write_overview_table, write_rows_table,
};

pub type NamedTables = BTreeMap<String, BTreeMap<String, Value>>;

/// Settings shared by every command for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandContext {
    pub labels: LabelMap,
    pub display_options: Vec<String>,
    pub output: OutputFormat,
}

pub fn run_rows_command(ctx: &CommandContext, args: &RowsArgs, out: &mut dyn Write) -> Result<()> {
    let tree = load_tree(&args.input)?;
    let mut rows = map_aggregations_to_rows(&tree);
    if let Some(namespace) = args.namespace {
        rows.retain(|candidate, _| *candidate == namespace);
    }

    if args.by_subscription {
        let groups = group_rows_by_subscription(rows.values().flatten(), &ctx.labels);
        return match ctx.output {
            OutputFormat::Json => {
                write_json(&groups, out).context("failed to write grouped rows JSON")
            }
            OutputFormat::Table => write_rows_table(
                groups
                    .iter()
                    .flat_map(|group| &group.apps)
                    .flat_map(|app| &app.rows),
                out,
            )
            .context("failed to write grouped rows table"),
        };
    }

    match ctx.output {
        OutputFormat::Json => write_json(&rows, out).context("failed to write rows JSON"),
        OutputFormat::Table => {
            write_rows_table(rows.values().flatten(), out).context("failed to write rows table")
        }
    }
}

pub fn run_findings_command(
    ctx: &CommandContext,
    args: &InputArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let tree = load_tree(&args.input)?;
    let rows = map_aggregations_to_rows(&tree);
    let findings = build_namespace_findings(&rows, &ctx.labels);

    match ctx.output {
        OutputFormat::Json => write_json(&findings, out).context("failed to write findings JSON"),
        OutputFormat::Table => {
            write_findings_table(&findings, out).context("failed to write findings table")
        }
    }
}

pub fn run_compare_command(
    ctx: &CommandContext,
    args: &CompareArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let tables = load_tables(&args.tables)?;
    let entries = compare_fields_across_tables(&tables);
    let summary = summarize_comparison(&entries);
    tracing::info!(
        tables = tables.len(),
        fields = entries.len(),
        matched = summary.matched,
        delta = summary.delta,
        missing = summary.missing,
        "compared tables"
    );

    write_comparison(ctx, &entries, out)
}

/// Runs one application's processed reporting windows through the table
/// comparator, with fields standing in as `true` values.
pub fn run_windows_command(
    ctx: &CommandContext,
    args: &WindowsArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let tree = load_tree(&args.input)?;
    let rows = map_aggregations_to_rows(&tree);
    let Some(row) = rows
        .get(&args.namespace)
        .into_iter()
        .flatten()
        .find(|row| row.sub_id == args.subscription && row.app_id == args.app)
    else {
        bail!(
            "no application {} in subscription {} of {}",
            args.app,
            args.subscription,
            args.input.display()
        );
    };

    let entries = compare_fields_across_tables(&row_presence_tables(row));
    tracing::debug!(
        app = %row.app_id,
        namespace = row.namespace.as_str(),
        fields = entries.len(),
        "compared reporting windows"
    );
    write_comparison(ctx, &entries, out)
}

fn write_comparison(
    ctx: &CommandContext,
    entries: &[ComparisonEntry],
    out: &mut dyn Write,
) -> Result<()> {
    match ctx.output {
        OutputFormat::Json => {
            let summary = summarize_comparison(entries);
            let value = serde_json::json!({ "summary": summary, "entries": entries });
            write_json(&value, out).context("failed to write comparison JSON")
        }
        OutputFormat::Table => {
            write_comparison_table(entries, out).context("failed to write comparison table")
        }
    }
}

pub fn run_coverage_command(
    ctx: &CommandContext,
    args: &InputArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let tree = load_tree(&args.input)?;
    let coverage = count_fields_across_apps(&tree);

    match ctx.output {
        OutputFormat::Json => write_json(&coverage, out).context("failed to write coverage JSON"),
        OutputFormat::Table => {
            write_coverage_table(&coverage, out).context("failed to write coverage table")
        }
    }
}

pub fn run_overview_command(
    ctx: &CommandContext,
    args: &InputArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let tree = load_tree(&args.input)?;
    let overview = summarize_subscriptions(&tree, &ctx.labels);

    match ctx.output {
        OutputFormat::Json => write_json(&overview, out).context("failed to write overview JSON"),
        OutputFormat::Table => {
            write_overview_table(&overview, out).context("failed to write overview table")
        }
    }
}

/// The audit report has no tabular form and is always written as JSON.
pub fn run_report_command(
    ctx: &CommandContext,
    args: &InputArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let tree = load_tree(&args.input)?;
    let report = build_audit_report(
        &tree,
        AuditRequest {
            labels: ctx.labels.clone(),
            display_options: ctx.display_options.clone(),
        },
    );
    write_json(&report, out).context("failed to write audit report")
}

pub fn load_tree(path: &Path) -> Result<AggregationTree> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read aggregation snapshot {}", path.display()))?;
    let tree = AggregationTree::from_json_str(&raw)
        .with_context(|| format!("invalid aggregation snapshot {}", path.display()))?;
    if tree.is_empty() {
        tracing::warn!(path = %path.display(), "aggregation snapshot holds no subscriptions");
    }
    Ok(tree)
}

pub fn load_labels(path: &Path) -> Result<LabelMap> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read label map {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("label map {} must be a JSON object of strings", path.display()))
}

/// Reads named tables. A table given as a string is a cached, JSON-encoded
/// object; if it cannot be decoded it is kept as an empty table.
pub fn load_tables(path: &Path) -> Result<NamedTables> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read tables {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid tables JSON {}", path.display()))?;
    let Value::Object(entries) = value else {
        bail!("tables file {} must hold a JSON object", path.display());
    };

    let tables: NamedTables = entries
        .into_iter()
        .map(|(name, table)| {
            let table: BTreeMap<String, Value> = match table {
                Value::Object(fields) => fields.into_iter().collect(),
                Value::String(encoded) => decode_cached_table(&name, &encoded).unwrap_or_default(),
                other => {
                    tracing::warn!(
                        table = %name,
                        kind = %json_kind(&other),
                        "table is not an object, treating as empty"
                    );
                    BTreeMap::new()
                }
            };
            (name, table)
        })
        .collect();

    Ok(tables)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn load_tables_decodes_cached_strings_and_tolerates_garbage() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("tables.json");
        fs::write(
            &path,
            json!({
                "crm": { "email": "a@x" },
                "cached": "{\"email\":\"b@x\"}",
                "broken": "{not json",
                "weird": 42
            })
            .to_string(),
        )
        .expect("write tables");

        let tables = load_tables(&path).expect("load tables");

        assert_eq!(tables.len(), 4);
        assert_eq!(tables["crm"]["email"], json!("a@x"));
        assert_eq!(tables["cached"]["email"], json!("b@x"));
        assert!(tables["broken"].is_empty());
        assert!(tables["weird"].is_empty());
    }

    #[test]
    fn load_tables_rejects_non_object_root() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("tables.json");
        fs::write(&path, "[1, 2]").expect("write tables");

        assert!(load_tables(&path).is_err());
    }

    #[test]
    fn load_tree_reports_unreadable_snapshot() {
        let temp = tempdir().expect("tempdir");
        let error = load_tree(&temp.path().join("missing.json")).expect_err("missing file");
        assert!(error.to_string().contains("failed to read aggregation snapshot"));
    }
}
