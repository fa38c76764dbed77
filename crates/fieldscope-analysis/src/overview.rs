use std::collections::BTreeMap;

use fieldscope_core::{
    AggregationTree, LabelMap, Namespace, ReportingWindow, SubscriptionId, compare_subscriptions,
    subscription_label,
};
use serde::{Deserialize, Serialize};

use crate::coverage::WindowCounts;
use crate::rollup::build_window_summaries;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionOverview {
    pub sub_id: SubscriptionId,
    pub label: String,
    pub app_count: u32,
    pub records_scanned: Option<u64>,
    pub non_null_records_by_namespace: BTreeMap<Namespace, u64>,
    /// Applications whose reporting window materialized.
    pub processed_apps: WindowCounts,
}

pub fn summarize_subscriptions(
    tree: &AggregationTree,
    labels: &LabelMap,
) -> Vec<SubscriptionOverview> {
    let mut overview: Vec<SubscriptionOverview> = tree
        .subscriptions
        .iter()
        .map(|(sub_id, subscription)| {
            let mut processed_apps = WindowCounts::default();
            for app in subscription.apps.values() {
                let processed = build_window_summaries(app).processed();
                for window in ReportingWindow::ALL {
                    if processed.get(window) {
                        processed_apps.increment(window);
                    }
                }
            }

            SubscriptionOverview {
                sub_id: sub_id.clone(),
                label: subscription_label(sub_id, labels).to_owned(),
                app_count: u32::try_from(subscription.apps.len()).unwrap_or(u32::MAX),
                records_scanned: subscription.records_scanned,
                non_null_records_by_namespace: subscription.non_null_records_by_namespace.clone(),
                processed_apps,
            }
        })
        .collect();

    overview.sort_by(|left, right| compare_subscriptions(&left.sub_id, &right.sub_id, labels));
    overview
}
