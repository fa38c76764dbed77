use std::collections::BTreeMap;

use fieldscope_core::{AggregationTree, LabelMap, Namespace, RowsByNamespace};
use serde::{Deserialize, Serialize};

use crate::coverage::{FieldCoverage, count_fields_across_apps};
use crate::findings::{NamespaceFindings, build_namespace_findings};
use crate::overview::{SubscriptionOverview, summarize_subscriptions};
use crate::rows::map_aggregations_to_rows;

pub const AUDIT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuditRequest {
    pub labels: LabelMap,
    /// Forwarded to the report untouched.
    pub display_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub schema_version: String,
    pub display_options: Vec<String>,
    pub subscriptions: Vec<SubscriptionOverview>,
    pub rows: RowsByNamespace,
    pub findings: Vec<NamespaceFindings>,
    pub coverage: BTreeMap<Namespace, Vec<FieldCoverage>>,
}

/// Recomputes every derived view from one tree snapshot.
pub fn build_audit_report(tree: &AggregationTree, request: AuditRequest) -> AuditReport {
    let rows = map_aggregations_to_rows(tree);
    let findings = build_namespace_findings(&rows, &request.labels);

    AuditReport {
        schema_version: AUDIT_SCHEMA_VERSION.to_owned(),
        subscriptions: summarize_subscriptions(tree, &request.labels),
        coverage: count_fields_across_apps(tree),
        display_options: request.display_options,
        rows,
        findings,
    }
}
