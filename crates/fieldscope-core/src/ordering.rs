use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{AggregationRow, AppId, FieldName, FieldSet, LabelMap, SubscriptionId};

/// Display label for a subscription, falling back to its raw id.
pub fn subscription_label<'a>(sub_id: &'a str, labels: &'a LabelMap) -> &'a str {
    labels
        .get(sub_id)
        .map(String::as_str)
        .filter(|label| !label.trim().is_empty())
        .unwrap_or(sub_id)
}

/// Orders subscriptions by display label, ties broken by raw id.
pub fn compare_subscriptions(left: &str, right: &str, labels: &LabelMap) -> Ordering {
    subscription_label(left, labels)
        .cmp(subscription_label(right, labels))
        .then_with(|| left.cmp(right))
}

/// Orders applications by name, ties broken by app id.
pub fn compare_apps(left_name: &str, left_id: &str, right_name: &str, right_id: &str) -> Ordering {
    left_name
        .cmp(right_name)
        .then_with(|| left_id.cmp(right_id))
}

pub fn sort_fields<I>(fields: I) -> FieldSet
where
    I: IntoIterator,
    I::Item: Into<FieldName>,
{
    let mut fields: Vec<FieldName> = fields.into_iter().map(Into::into).collect();
    fields.sort();
    fields.dedup();
    fields
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRows {
    pub app_id: AppId,
    pub app_name: String,
    pub rows: Vec<AggregationRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionGroup {
    pub sub_id: SubscriptionId,
    pub label: String,
    pub apps: Vec<AppRows>,
}

/// Groups rows per subscription and application for presentation.
///
/// Subscriptions follow [`compare_subscriptions`], applications follow
/// [`compare_apps`], and rows keep their relative input order.
pub fn group_rows_by_subscription<'a, I>(rows: I, labels: &LabelMap) -> Vec<SubscriptionGroup>
where
    I: IntoIterator<Item = &'a AggregationRow>,
{
    let mut groups: Vec<SubscriptionGroup> = Vec::new();

    for row in rows {
        let group = match groups.iter().position(|group| group.sub_id == row.sub_id) {
            Some(index) => &mut groups[index],
            None => {
                groups.push(SubscriptionGroup {
                    sub_id: row.sub_id.clone(),
                    label: subscription_label(&row.sub_id, labels).to_owned(),
                    apps: Vec::new(),
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };

        match group.apps.iter_mut().find(|app| app.app_id == row.app_id) {
            Some(app) => app.rows.push(row.clone()),
            None => group.apps.push(AppRows {
                app_id: row.app_id.clone(),
                app_name: row.app_name.clone(),
                rows: vec![row.clone()],
            }),
        }
    }

    groups.sort_by(|left, right| compare_subscriptions(&left.sub_id, &right.sub_id, labels));
    for group in &mut groups {
        group.apps.sort_by(|left, right| {
            compare_apps(&left.app_name, &left.app_id, &right.app_name, &right.app_id)
        });
    }

    groups
}
