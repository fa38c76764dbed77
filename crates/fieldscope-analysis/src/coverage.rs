use std::collections::BTreeMap;

use fieldscope_core::{AggregationTree, FieldName, Namespace, ReportingWindow};
use serde::{Deserialize, Serialize};

use crate::rollup::build_window_summaries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WindowCounts {
    pub window7: u32,
    pub window30: u32,
    pub window180: u32,
}

impl WindowCounts {
    pub fn get(&self, window: ReportingWindow) -> u32 {
        match window {
            ReportingWindow::Days7 => self.window7,
            ReportingWindow::Days30 => self.window30,
            ReportingWindow::Days180 => self.window180,
        }
    }

    pub(crate) fn increment(&mut self, window: ReportingWindow) {
        match window {
            ReportingWindow::Days7 => self.window7 += 1,
            ReportingWindow::Days30 => self.window30 += 1,
            ReportingWindow::Days180 => self.window180 += 1,
        }
    }
}

/// How many applications report a field in each reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCoverage {
    pub field: FieldName,
    pub apps: WindowCounts,
}

/// Counts, per namespace and field, the applications whose 7/30/180-day
/// reporting window contains the field. Fields are sorted; every namespace
/// is present.
pub fn count_fields_across_apps(tree: &AggregationTree) -> BTreeMap<Namespace, Vec<FieldCoverage>> {
    let mut counts: BTreeMap<Namespace, BTreeMap<FieldName, WindowCounts>> = Namespace::ALL
        .into_iter()
        .map(|namespace| (namespace, BTreeMap::new()))
        .collect();

    for subscription in tree.subscriptions.values() {
        for app in subscription.apps.values() {
            let summaries = build_window_summaries(app);
            for window in ReportingWindow::ALL {
                for namespace in Namespace::ALL {
                    let Some(fields) = summaries.fields(window, namespace) else {
                        continue;
                    };
                    let namespace_counts = counts.entry(namespace).or_default();
                    for field in fields {
                        namespace_counts
                            .entry(field.clone())
                            .or_default()
                            .increment(window);
                    }
                }
            }
        }
    }

    counts
        .into_iter()
        .map(|(namespace, fields)| {
            let coverage: Vec<FieldCoverage> = fields
                .into_iter()
                .map(|(field, apps)| FieldCoverage { field, apps })
                .collect();
            (namespace, coverage)
        })
        .collect()
}
