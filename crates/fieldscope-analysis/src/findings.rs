use std::collections::BTreeSet;

use fieldscope_core::{
    AggregationRow, LabelMap, Namespace, ReportingWindow, RowsByNamespace, subscription_label,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceFindings {
    pub namespace: Namespace,
    pub label: String,
    /// Every row kept the same fields across its reporting windows.
    pub unchanged: bool,
    pub findings: Vec<String>,
}

/// Sentences for each field of `row` whose presence differs between its
/// processed reporting windows. A processed window without fields counts as
/// empty; windows that never materialized take no part.
pub fn build_row_field_findings(row: &AggregationRow, sub_label: &str) -> Vec<String> {
    let windows = comparable_windows(row);
    if windows.len() < 2 {
        return Vec::new();
    }

    let union: BTreeSet<&str> = windows
        .iter()
        .flat_map(|(_, fields)| fields.iter().copied())
        .collect();

    let mut findings = Vec::new();
    for field in union {
        let (present, missing): (Vec<_>, Vec<_>) = windows
            .iter()
            .partition(|(_, fields)| fields.contains(field));
        if missing.is_empty() {
            continue;
        }

        let present: Vec<&str> = present.iter().map(|(window, _)| window.label()).collect();
        let missing: Vec<&str> = missing.iter().map(|(window, _)| window.label()).collect();
        findings.push(format!(
            "{field} is present in {} but not {} in {} ({sub_label}) for {}.",
            natural_join(&present),
            natural_join(&missing),
            row.app_name,
            row.namespace.label(),
        ));
    }

    findings
}

/// Per-namespace findings over already ordered rows.
///
/// Only rows with at least two processed windows are compared. A namespace
/// whose compared rows all match gets a single "no change" statement. As soon
/// as one row drifts, the namespace lists per-field findings instead; rows
/// that still match add nothing. A namespace with nothing to compare gets no
/// statement.
pub fn build_namespace_findings(
    rows: &RowsByNamespace,
    labels: &LabelMap,
) -> Vec<NamespaceFindings> {
    Namespace::ALL
        .into_iter()
        .map(|namespace| {
            let compared: Vec<(&AggregationRow, bool)> = rows
                .get(&namespace)
                .into_iter()
                .flatten()
                .filter_map(|row| row_windows_match(row).map(|matched| (row, matched)))
                .collect();
            let unchanged = !compared.is_empty() && compared.iter().all(|(_, matched)| *matched);

            let findings = if compared.is_empty() {
                Vec::new()
            } else if unchanged {
                vec![no_change_statement(namespace)]
            } else {
                compared
                    .iter()
                    .filter(|(_, matched)| !matched)
                    .flat_map(|(row, _)| {
                        build_row_field_findings(row, subscription_label(&row.sub_id, labels))
                    })
                    .collect()
            };

            NamespaceFindings {
                namespace,
                label: namespace.label().to_owned(),
                unchanged,
                findings,
            }
        })
        .collect()
}

pub fn no_change_statement(namespace: Namespace) -> String {
    format!("No change to fields for {}.", namespace.label())
}

/// `a`, `a and b`, `a, b, and c`.
pub fn natural_join(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => (*only).to_owned(),
        [first, second] => format!("{first} and {second}"),
        [head @ .., last] => format!("{}, and {last}", head.join(", ")),
    }
}

/// `None` when the row has fewer than two processed windows to compare.
fn row_windows_match(row: &AggregationRow) -> Option<bool> {
    let windows = comparable_windows(row);
    if windows.len() < 2 {
        return None;
    }
    Some(windows.windows(2).all(|pair| pair[0].1 == pair[1].1))
}

fn comparable_windows(row: &AggregationRow) -> Vec<(ReportingWindow, BTreeSet<&str>)> {
    ReportingWindow::ALL
        .into_iter()
        .filter(|window| row.processed.get(*window))
        .map(|window| {
            let fields: BTreeSet<&str> = row
                .window(window)
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect();
            (window, fields)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use fieldscope_core::ProcessedWindows;

    use super::*;

    fn fields(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|name| (*name).to_owned()).collect())
    }

    fn row(
        app_name: &str,
        window7: Option<Vec<String>>,
        window30: Option<Vec<String>>,
        window180: Option<Vec<String>>,
    ) -> AggregationRow {
        AggregationRow {
            sub_id: "S1".to_owned(),
            app_id: format!("id-{app_name}"),
            app_name: app_name.to_owned(),
            namespace: Namespace::Visitor,
            window7,
            window30,
            window180,
            processed: ProcessedWindows::all(),
        }
    }

    #[test]
    fn field_added_after_seven_days_yields_one_finding() {
        let row = row("Web", fields(&["a"]), fields(&["a", "b"]), fields(&["a", "b"]));

        let findings = build_row_field_findings(&row, "Prod");

        assert_eq!(
            findings,
            vec!["b is present in 30 days and 180 days but not 7 days in Web (Prod) for Visitor."]
        );
    }

    #[test]
    fn empty_processed_window_counts_as_no_fields() {
        let row = row("Web", None, fields(&["a"]), fields(&["a"]));

        let findings = build_row_field_findings(&row, "S1");

        assert_eq!(
            findings,
            vec!["a is present in 30 days and 180 days but not 7 days in Web (S1) for Visitor."]
        );
    }

    #[test]
    fn unprocessed_windows_do_not_produce_findings() {
        let mut partial = row("Web", fields(&["a"]), fields(&["a", "b"]), None);
        partial.processed.window180 = false;
        assert_eq!(
            build_row_field_findings(&partial, "S1"),
            vec!["b is present in 30 days but not 7 days in Web (S1) for Visitor."]
        );

        let mut only_seven = row("Web", fields(&["a"]), None, None);
        only_seven.processed = ProcessedWindows {
            window7: true,
            window30: false,
            window180: false,
        };
        assert!(build_row_field_findings(&only_seven, "S1").is_empty());
    }

    #[test]
    fn natural_join_handles_lists_of_any_length() {
        assert_eq!(natural_join(&[]), "");
        assert_eq!(natural_join(&["7 days"]), "7 days");
        assert_eq!(natural_join(&["7 days", "30 days"]), "7 days and 30 days");
        assert_eq!(
            natural_join(&["7 days", "30 days", "180 days"]),
            "7 days, 30 days, and 180 days"
        );
    }

    #[test]
    fn matching_namespace_gets_blanket_statement() {
        let rows = RowsByNamespace::from([(
            Namespace::Visitor,
            vec![
                row("Api", fields(&["a"]), fields(&["a"]), fields(&["a"])),
                row("Web", None, None, None),
            ],
        )]);

        let findings = build_namespace_findings(&rows, &LabelMap::new());
        let visitor = &findings[0];

        assert_eq!(findings.len(), 4);
        assert!(visitor.unchanged);
        assert_eq!(visitor.findings, vec!["No change to fields for Visitor."]);
        assert!(findings[1].findings.is_empty());
        assert!(!findings[1].unchanged);
    }

    #[test]
    fn one_drifting_row_replaces_blanket_statement() {
        let labels = LabelMap::from([("S1".to_owned(), "Production".to_owned())]);
        let rows = RowsByNamespace::from([(
            Namespace::Visitor,
            vec![
                row("Api", fields(&["a"]), fields(&["a"]), fields(&["a"])),
                row("Web", fields(&["x"]), fields(&["x"]), fields(&["x", "y"])),
            ],
        )]);

        let findings = build_namespace_findings(&rows, &labels);
        let visitor = &findings[0];

        assert!(!visitor.unchanged);
        assert_eq!(
            visitor.findings,
            vec![
                "y is present in 180 days but not 7 days and 30 days in Web (Production) \
                 for Visitor."
            ]
        );
    }

    #[test]
    fn rows_with_a_single_processed_window_support_no_statement() {
        let mut only_seven = row("Web", fields(&["a"]), None, None);
        only_seven.processed = ProcessedWindows {
            window7: true,
            window30: false,
            window180: false,
        };
        let rows = RowsByNamespace::from([(Namespace::Visitor, vec![only_seven.clone()])]);

        let findings = build_namespace_findings(&rows, &LabelMap::new());

        assert!(!findings[0].unchanged);
        assert!(findings[0].findings.is_empty());

        let rows = RowsByNamespace::from([(
            Namespace::Visitor,
            vec![
                row("Api", fields(&["a"]), fields(&["a"]), fields(&["a"])),
                only_seven,
            ],
        )]);

        let findings = build_namespace_findings(&rows, &LabelMap::new());

        assert!(findings[0].unchanged);
        assert_eq!(findings[0].findings, vec!["No change to fields for Visitor."]);
    }
}
