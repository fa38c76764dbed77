use std::collections::{BTreeMap, BTreeSet};

use fieldscope_core::{FieldSet, Namespace, RawWindowBucket};

/// Field names per namespace. Every namespace is present; `None` means no
/// contributing bucket supplied a single field for it.
pub type NamespaceFields = BTreeMap<Namespace, Option<FieldSet>>;

pub fn summarize_namespace_fields(buckets: &[&RawWindowBucket]) -> NamespaceFields {
    Namespace::ALL
        .into_iter()
        .map(|namespace| {
            let union: BTreeSet<&str> = buckets
                .iter()
                .filter_map(|bucket| bucket.fields(namespace))
                .flat_map(|fields| fields.keys().map(String::as_str))
                .collect();

            let fields = (!union.is_empty())
                .then(|| union.into_iter().map(str::to_owned).collect::<FieldSet>());
            (namespace, fields)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use fieldscope_core::{AggregationTree, RawWindowKey};

    use super::*;

    fn buckets_from(value: serde_json::Value) -> Vec<RawWindowBucket> {
        let tree = AggregationTree::from_value(&json!({
            "S": { "apps": { "A": { "windows": value } } }
        }));
        let app = &tree.subscriptions["S"].apps["A"];
        RawWindowKey::ALL
            .into_iter()
            .filter_map(|key| app.window(key).cloned())
            .collect()
    }

    #[test]
    fn unions_sorts_and_dedupes_fields() {
        let buckets = buckets_from(json!({
            "7": { "isProcessed": true, "namespaces": { "visitor": { "phone": {}, "Email": {} } } },
            "23": { "isProcessed": true, "namespaces": { "visitor": { "phone": {}, "age": {} } } }
        }));
        let refs: Vec<&RawWindowBucket> = buckets.iter().collect();

        let summary = summarize_namespace_fields(&refs);

        assert_eq!(
            summary[&Namespace::Visitor],
            Some(vec!["Email".to_owned(), "age".to_owned(), "phone".to_owned()])
        );
        assert_eq!(summary.len(), Namespace::ALL.len());
    }

    #[test]
    fn empty_and_unreferenced_namespaces_are_none() {
        let buckets = buckets_from(json!({
            "7": { "isProcessed": true, "namespaces": { "account": {}, "custom": "oops" } }
        }));
        let refs: Vec<&RawWindowBucket> = buckets.iter().collect();

        let summary = summarize_namespace_fields(&refs);

        assert_eq!(summary[&Namespace::Account], None);
        assert_eq!(summary[&Namespace::Custom], None);
        assert_eq!(summary[&Namespace::Visitor], None);
        assert_eq!(summary[&Namespace::Salesforce], None);
    }

    #[test]
    fn no_buckets_yields_all_none() {
        let summary = summarize_namespace_fields(&[]);
        assert!(summary.values().all(Option::is_none));
    }
}
