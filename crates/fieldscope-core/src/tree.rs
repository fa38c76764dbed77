use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AppId, CoreError, FieldName, Namespace, RawWindowKey, SubscriptionId};

/// Snapshot of every subscription's raw scan results.
///
/// Decoding is lenient: shapes that do not match are dropped at the
/// smallest granularity (one subscription, app, window or namespace) and
/// never fail the snapshot as a whole.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub struct AggregationTree {
    pub subscriptions: BTreeMap<SubscriptionId, SubscriptionBucket>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionBucket {
    pub apps: BTreeMap<AppId, AppBucket>,
    pub records_scanned: Option<u64>,
    pub non_null_records_by_namespace: BTreeMap<Namespace, u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBucket {
    pub app_name: Option<String>,
    pub windows: BTreeMap<RawWindowKey, RawWindowBucket>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWindowBucket {
    pub is_processed: bool,
    pub namespaces: BTreeMap<Namespace, BTreeMap<FieldName, FieldBucket>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FieldBucket {
    pub total: Option<u64>,
}

impl AggregationTree {
    pub fn from_json_str(raw: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(root) = value.as_object() else {
            return Self::default();
        };

        let subscriptions = root
            .iter()
            .filter_map(|(sub_id, bucket)| {
                let bucket = bucket.as_object()?;
                Some((sub_id.clone(), SubscriptionBucket::from_object(bucket)))
            })
            .collect();

        Self { subscriptions }
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn app_count(&self) -> usize {
        self.subscriptions
            .values()
            .map(|subscription| subscription.apps.len())
            .sum()
    }
}

impl From<Value> for AggregationTree {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl SubscriptionBucket {
    fn from_object(object: &Map<String, Value>) -> Self {
        let apps = object
            .get("apps")
            .and_then(Value::as_object)
            .map(|apps| {
                apps.iter()
                    .filter_map(|(app_id, app)| {
                        let app = app.as_object()?;
                        Some((app_id.clone(), AppBucket::from_object(app)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let non_null_records_by_namespace = object
            .get("nonNullRecordsByNamespace")
            .and_then(Value::as_object)
            .map(|counts| {
                counts
                    .iter()
                    .filter_map(|(namespace, count)| {
                        let namespace = namespace.parse::<Namespace>().ok()?;
                        Some((namespace, as_count(count)?))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            apps,
            records_scanned: object.get("recordsScanned").and_then(as_count),
            non_null_records_by_namespace,
        }
    }
}

impl AppBucket {
    fn from_object(object: &Map<String, Value>) -> Self {
        let app_name = object
            .get("appName")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);

        let mut windows = BTreeMap::new();
        if let Some(raw_windows) = object.get("windows").and_then(Value::as_object) {
            for (key, bucket) in raw_windows {
                let Some(key) = RawWindowKey::parse_key(key) else {
                    continue;
                };
                let Some(bucket) = bucket.as_object() else {
                    continue;
                };
                // "7" and "7.0" can both appear; the first in key order wins.
                windows
                    .entry(key)
                    .or_insert_with(|| RawWindowBucket::from_object(bucket));
            }
        }

        Self { app_name, windows }
    }

    pub fn window(&self, key: RawWindowKey) -> Option<&RawWindowBucket> {
        self.windows.get(&key)
    }

    pub fn is_processed(&self, key: RawWindowKey) -> bool {
        self.window(key).is_some_and(|bucket| bucket.is_processed)
    }

    pub fn display_name<'a>(&'a self, app_id: &'a str) -> &'a str {
        self.app_name.as_deref().unwrap_or(app_id)
    }
}

impl RawWindowBucket {
    fn from_object(object: &Map<String, Value>) -> Self {
        let is_processed = matches!(object.get("isProcessed"), Some(Value::Bool(true)));

        let namespaces = object
            .get("namespaces")
            .and_then(Value::as_object)
            .map(|namespaces| {
                namespaces
                    .iter()
                    .filter_map(|(namespace, fields)| {
                        let namespace = namespace.parse::<Namespace>().ok()?;
                        let fields = fields.as_object()?;
                        let fields = fields
                            .iter()
                            .map(|(field, bucket)| (field.clone(), FieldBucket::from_value(bucket)))
                            .collect();
                        Some((namespace, fields))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            is_processed,
            namespaces,
        }
    }

    pub fn fields(&self, namespace: Namespace) -> Option<&BTreeMap<FieldName, FieldBucket>> {
        self.namespaces.get(&namespace)
    }
}

impl FieldBucket {
    fn from_value(value: &Value) -> Self {
        Self {
            total: value.get("total").and_then(as_count),
        }
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|count| count.is_finite() && *count >= 0.0)
            .map(|count| count.round() as u64)
    })
}
