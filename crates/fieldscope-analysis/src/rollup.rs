use fieldscope_core::{
    AppBucket, FieldSet, Namespace, ProcessedWindows, RawWindowBucket, ReportingWindow,
};
use serde::{Deserialize, Serialize};

use crate::summarize::{NamespaceFields, summarize_namespace_fields};

/// Reporting windows for one application. A window is `None` when any raw
/// scan it depends on has not been processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WindowSummaries {
    pub window7: Option<NamespaceFields>,
    pub window30: Option<NamespaceFields>,
    pub window180: Option<NamespaceFields>,
}

impl WindowSummaries {
    pub fn get(&self, window: ReportingWindow) -> Option<&NamespaceFields> {
        match window {
            ReportingWindow::Days7 => self.window7.as_ref(),
            ReportingWindow::Days30 => self.window30.as_ref(),
            ReportingWindow::Days180 => self.window180.as_ref(),
        }
    }

    pub fn fields(&self, window: ReportingWindow, namespace: Namespace) -> Option<&FieldSet> {
        self.get(window)
            .and_then(|summary| summary.get(&namespace))
            .and_then(Option::as_ref)
    }

    pub fn processed(&self) -> ProcessedWindows {
        ProcessedWindows {
            window7: self.window7.is_some(),
            window30: self.window30.is_some(),
            window180: self.window180.is_some(),
        }
    }
}

pub fn build_window_summaries(app: &AppBucket) -> WindowSummaries {
    WindowSummaries {
        window7: rollup_window(app, ReportingWindow::Days7),
        window30: rollup_window(app, ReportingWindow::Days30),
        window180: rollup_window(app, ReportingWindow::Days180),
    }
}

fn rollup_window(app: &AppBucket, window: ReportingWindow) -> Option<NamespaceFields> {
    let mut buckets: Vec<&RawWindowBucket> = Vec::with_capacity(window.raw_windows().len());
    for key in window.raw_windows() {
        match app.window(*key) {
            Some(bucket) if bucket.is_processed => buckets.push(bucket),
            _ => {
                tracing::debug!(
                    window = window.label(),
                    raw_window = key.days(),
                    "reporting window skipped, raw scan not processed"
                );
                return None;
            }
        }
    }

    Some(summarize_namespace_fields(&buckets))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use fieldscope_core::AggregationTree;

    use super::*;

    fn app_from(windows: serde_json::Value) -> AppBucket {
        let tree = AggregationTree::from_value(&json!({
            "S1": { "apps": { "A1": { "windows": windows } } }
        }));
        tree.subscriptions["S1"].apps["A1"].clone()
    }

    fn names(fields: &[&str]) -> Option<FieldSet> {
        Some(fields.iter().map(|field| (*field).to_owned()).collect())
    }

    #[test]
    fn windows_are_cumulative_unions() {
        let app = app_from(json!({
            "7": { "isProcessed": true, "namespaces": { "visitor": { "email": {} } } },
            "23": { "isProcessed": true, "namespaces": { "visitor": { "phone": {} } } },
            "150": { "isProcessed": true, "namespaces": { "visitor": { "zip": {} }, "account": { "tier": {} } } }
        }));

        let summaries = build_window_summaries(&app);

        assert_eq!(
            summaries.fields(ReportingWindow::Days7, Namespace::Visitor).cloned(),
            names(&["email"])
        );
        assert_eq!(
            summaries.fields(ReportingWindow::Days30, Namespace::Visitor).cloned(),
            names(&["email", "phone"])
        );
        assert_eq!(
            summaries.fields(ReportingWindow::Days180, Namespace::Visitor).cloned(),
            names(&["email", "phone", "zip"])
        );
        assert_eq!(summaries.fields(ReportingWindow::Days30, Namespace::Account), None);
        assert_eq!(
            summaries.fields(ReportingWindow::Days180, Namespace::Account).cloned(),
            names(&["tier"])
        );
        assert_eq!(summaries.processed(), ProcessedWindows::all());
    }

    #[test]
    fn unprocessed_23_gates_both_longer_windows() {
        let app = app_from(json!({
            "7": { "isProcessed": true, "namespaces": { "visitor": { "email": {} } } },
            "23": { "isProcessed": false, "namespaces": { "visitor": { "phone": {} } } },
            "150": { "isProcessed": true, "namespaces": { "visitor": { "zip": {} } } }
        }));

        let summaries = build_window_summaries(&app);

        assert!(summaries.window7.is_some());
        assert_eq!(summaries.window30, None);
        assert_eq!(summaries.window180, None);
    }

    #[test]
    fn missing_raw_7_leaves_every_window_absent() {
        let app = app_from(json!({
            "23": { "isProcessed": true, "namespaces": { "visitor": { "phone": {} } } },
            "150": { "isProcessed": true, "namespaces": {} }
        }));

        assert_eq!(build_window_summaries(&app), WindowSummaries::default());
    }

    #[test]
    fn processed_but_empty_window_differs_from_absent_window() {
        let app = app_from(json!({
            "7": { "isProcessed": true, "namespaces": {} }
        }));

        let summaries = build_window_summaries(&app);

        let window7 = summaries.window7.as_ref().expect("7-day window materialized");
        assert!(window7.values().all(Option::is_none));
        assert_eq!(summaries.window30, None);
    }
}
