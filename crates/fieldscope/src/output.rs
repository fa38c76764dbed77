use std::io::Write;

use fieldscope_analysis::{FieldCoverage, NamespaceFindings, SubscriptionOverview};
use fieldscope_core::{AggregationRow, ComparisonEntry, FieldSet, Namespace};
use serde::Serialize;

pub fn write_json<T: Serialize>(value: &T, out: &mut dyn Write) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

pub fn write_rows_table<'a, I>(rows: I, out: &mut dyn Write) -> std::io::Result<()>
where
    I: IntoIterator<Item = &'a AggregationRow>,
{
    writeln!(
        out,
        "namespace\tsub_id\tapp_id\tapp_name\twindow7\twindow30\twindow180"
    )?;
    for row in rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.namespace.as_str(),
            normalize_cell(&row.sub_id),
            normalize_cell(&row.app_id),
            normalize_cell(&row.app_name),
            field_cell(row.processed.window7, row.window7.as_ref()),
            field_cell(row.processed.window30, row.window30.as_ref()),
            field_cell(row.processed.window180, row.window180.as_ref()),
        )?;
    }
    Ok(())
}

pub fn write_findings_table(
    findings: &[NamespaceFindings],
    out: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(out, "namespace\tfinding")?;
    for namespace in findings {
        for finding in &namespace.findings {
            writeln!(
                out,
                "{}\t{}",
                namespace.namespace.as_str(),
                normalize_cell(finding)
            )?;
        }
    }
    Ok(())
}

pub fn write_comparison_table(
    entries: &[ComparisonEntry],
    out: &mut dyn Write,
) -> std::io::Result<()> {
    let tables: Vec<&str> = entries
        .first()
        .map(|entry| entry.values_by_table.keys().map(String::as_str).collect())
        .unwrap_or_default();

    write!(out, "field\tstatus")?;
    for table in &tables {
        write!(out, "\t{}", normalize_cell(table))?;
    }
    writeln!(out)?;

    for entry in entries {
        write!(
            out,
            "{}\t{}",
            normalize_cell(&entry.field),
            entry.status.as_str()
        )?;
        for table in &tables {
            let cell = match entry.values_by_table.get(*table).and_then(Option::as_ref) {
                Some(serde_json::Value::String(text)) => normalize_cell(text),
                Some(value) => value.to_string(),
                None => "-".to_owned(),
            };
            write!(out, "\t{cell}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_coverage_table<'a, I>(coverage: I, out: &mut dyn Write) -> std::io::Result<()>
where
    I: IntoIterator<Item = (&'a Namespace, &'a Vec<FieldCoverage>)>,
{
    writeln!(out, "namespace\tfield\tapps_7\tapps_30\tapps_180")?;
    for (namespace, fields) in coverage {
        for entry in fields {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                namespace.as_str(),
                normalize_cell(&entry.field),
                entry.apps.window7,
                entry.apps.window30,
                entry.apps.window180
            )?;
        }
    }
    Ok(())
}

pub fn write_overview_table(
    overview: &[SubscriptionOverview],
    out: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(
        out,
        "sub_id\tlabel\tapps\trecords_scanned\tprocessed_7\tprocessed_30\tprocessed_180"
    )?;
    for entry in overview {
        let records = entry
            .records_scanned
            .map(|count| count.to_string())
            .unwrap_or_else(|| "-".to_owned());
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            normalize_cell(&entry.sub_id),
            normalize_cell(&entry.label),
            entry.app_count,
            records,
            entry.processed_apps.window7,
            entry.processed_apps.window30,
            entry.processed_apps.window180
        )?;
    }
    Ok(())
}

/// `-` for a window that never materialized, empty for one without fields.
fn field_cell(processed: bool, fields: Option<&FieldSet>) -> String {
    if !processed {
        return "-".to_owned();
    }
    fields
        .map(|fields| normalize_cell(&fields.join(",")))
        .unwrap_or_default()
}

fn normalize_cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}
