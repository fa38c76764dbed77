mod cache;
mod ordering;
mod tree;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::{decode_cached_field_list, decode_cached_table};
pub use ordering::{
    AppRows, SubscriptionGroup, compare_apps, compare_subscriptions,
    group_rows_by_subscription, sort_fields, subscription_label,
};
pub use tree::{AggregationTree, AppBucket, FieldBucket, RawWindowBucket, SubscriptionBucket};

pub type SubscriptionId = String;
pub type AppId = String;
pub type FieldName = String;

/// Sorted, deduplicated field names.
pub type FieldSet = Vec<FieldName>;

/// Subscription id to display label.
pub type LabelMap = BTreeMap<SubscriptionId, String>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to parse aggregation JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Visitor,
    Account,
    Custom,
    Salesforce,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Visitor,
        Namespace::Account,
        Namespace::Custom,
        Namespace::Salesforce,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visitor => "visitor",
            Self::Account => "account",
            Self::Custom => "custom",
            Self::Salesforce => "salesforce",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Visitor => "Visitor",
            Self::Account => "Account",
            Self::Custom => "Custom",
            Self::Salesforce => "Salesforce",
        }
    }
}

impl std::str::FromStr for Namespace {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "visitor" => Ok(Self::Visitor),
            "account" => Ok(Self::Account),
            "custom" => Ok(Self::Custom),
            "salesforce" => Ok(Self::Salesforce),
            other => Err(format!(
                "invalid namespace '{other}', expected one of: visitor, account, custom, salesforce"
            )),
        }
    }
}

/// Lookback of one raw scan, shared with the upstream scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub enum RawWindowKey {
    Days7,
    Days23,
    Days150,
}

impl RawWindowKey {
    pub const ALL: [RawWindowKey; 3] = [
        RawWindowKey::Days7,
        RawWindowKey::Days23,
        RawWindowKey::Days150,
    ];

    pub fn days(self) -> u32 {
        match self {
            Self::Days7 => 7,
            Self::Days23 => 23,
            Self::Days150 => 150,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Self::Days7),
            23 => Some(Self::Days23),
            150 => Some(Self::Days150),
            _ => None,
        }
    }

    /// Accepts both `"7"` and numeric spellings such as `"7.0"`.
    pub fn parse_key(key: &str) -> Option<Self> {
        let key = key.trim();
        if let Ok(days) = key.parse::<u32>() {
            return Self::from_days(days);
        }

        let days = key.parse::<f64>().ok()?;
        if days.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&days) {
            return None;
        }
        Self::from_days(days as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub enum ReportingWindow {
    Days7,
    Days30,
    Days180,
}

impl ReportingWindow {
    pub const ALL: [ReportingWindow; 3] = [
        ReportingWindow::Days7,
        ReportingWindow::Days30,
        ReportingWindow::Days180,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Days7 => "7 days",
            Self::Days30 => "30 days",
            Self::Days180 => "180 days",
        }
    }

    /// Raw scans a reporting window is the union of. All of them must be
    /// processed before the window materializes.
    pub fn raw_windows(self) -> &'static [RawWindowKey] {
        match self {
            Self::Days7 => &[RawWindowKey::Days7],
            Self::Days30 => &[RawWindowKey::Days7, RawWindowKey::Days23],
            Self::Days180 => &RawWindowKey::ALL,
        }
    }
}

/// Which reporting windows had every prerequisite raw scan processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProcessedWindows {
    pub window7: bool,
    pub window30: bool,
    pub window180: bool,
}

impl ProcessedWindows {
    pub fn all() -> Self {
        Self {
            window7: true,
            window30: true,
            window180: true,
        }
    }

    pub fn get(&self, window: ReportingWindow) -> bool {
        match window {
            ReportingWindow::Days7 => self.window7,
            ReportingWindow::Days30 => self.window30,
            ReportingWindow::Days180 => self.window180,
        }
    }
}

/// One (application, namespace) pair across the three reporting windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRow {
    pub sub_id: SubscriptionId,
    pub app_id: AppId,
    pub app_name: String,
    pub namespace: Namespace,
    pub window7: Option<FieldSet>,
    pub window30: Option<FieldSet>,
    pub window180: Option<FieldSet>,
    pub processed: ProcessedWindows,
}

impl AggregationRow {
    pub fn window(&self, window: ReportingWindow) -> Option<&FieldSet> {
        match window {
            ReportingWindow::Days7 => self.window7.as_ref(),
            ReportingWindow::Days30 => self.window30.as_ref(),
            ReportingWindow::Days180 => self.window180.as_ref(),
        }
    }
}

pub type RowsByNamespace = BTreeMap<Namespace, Vec<AggregationRow>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Match,
    Delta,
    Missing,
}

impl ComparisonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Delta => "delta",
            Self::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub field: FieldName,
    pub values_by_table: BTreeMap<String, Option<serde_json::Value>>,
    pub status: ComparisonStatus,
}
