mod compare;
mod coverage;
mod findings;
mod overview;
mod report;
mod rollup;
mod rows;
mod summarize;

pub use compare::{
    ComparisonSummary, compare_fields_across_tables, row_presence_tables, summarize_comparison,
};
pub use coverage::{FieldCoverage, WindowCounts, count_fields_across_apps};
pub use findings::{
    NamespaceFindings, build_namespace_findings, build_row_field_findings, natural_join,
    no_change_statement,
};
pub use overview::{SubscriptionOverview, summarize_subscriptions};
pub use report::{AUDIT_SCHEMA_VERSION, AuditReport, AuditRequest, build_audit_report};
pub use rollup::{WindowSummaries, build_window_summaries};
pub use rows::map_aggregations_to_rows;
pub use summarize::{NamespaceFields, summarize_namespace_fields};
