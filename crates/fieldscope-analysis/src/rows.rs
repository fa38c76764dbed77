use fieldscope_core::{
    AggregationRow, AggregationTree, Namespace, ReportingWindow, RowsByNamespace, compare_apps,
};

use crate::rollup::build_window_summaries;

/// Flattens the tree into one row per (application, namespace).
///
/// Every namespace is present in the result, possibly with no rows. Rows are
/// ordered by subscription id, then app name, then app id.
pub fn map_aggregations_to_rows(tree: &AggregationTree) -> RowsByNamespace {
    let mut rows: RowsByNamespace = Namespace::ALL
        .into_iter()
        .map(|namespace| (namespace, Vec::new()))
        .collect();

    for (sub_id, subscription) in &tree.subscriptions {
        for (app_id, app) in &subscription.apps {
            let summaries = build_window_summaries(app);
            let processed = summaries.processed();
            let app_name = app.display_name(app_id);

            for namespace in Namespace::ALL {
                let fields = |window| summaries.fields(window, namespace).cloned();
                rows.entry(namespace).or_default().push(AggregationRow {
                    sub_id: sub_id.clone(),
                    app_id: app_id.clone(),
                    app_name: app_name.to_owned(),
                    namespace,
                    window7: fields(ReportingWindow::Days7),
                    window30: fields(ReportingWindow::Days30),
                    window180: fields(ReportingWindow::Days180),
                    processed,
                });
            }
        }
    }

    for namespace_rows in rows.values_mut() {
        namespace_rows.sort_by(|left, right| {
            left.sub_id.cmp(&right.sub_id).then_with(|| {
                compare_apps(&left.app_name, &left.app_id, &right.app_name, &right.app_id)
            })
        });
    }

    tracing::debug!(
        subscriptions = tree.subscriptions.len(),
        apps = tree.app_count(),
        "mapped aggregation tree to rows"
    );

    rows
}
