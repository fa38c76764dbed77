use std::collections::BTreeMap;

use serde_json::Value;

use crate::{FieldSet, sort_fields};

/// Decodes a field list previously stored as a JSON string.
///
/// Undecodable input is logged and treated as absent.
pub fn decode_cached_field_list(key: &str, raw: &str) -> Option<FieldSet> {
    match serde_json::from_str::<Option<Vec<String>>>(raw) {
        Ok(fields) => fields.map(sort_fields),
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring unreadable cached field list");
            None
        }
    }
}

/// Decodes a `field -> value` table previously stored as a JSON string.
pub fn decode_cached_table(key: &str, raw: &str) -> Option<BTreeMap<String, Value>> {
    match serde_json::from_str::<Option<BTreeMap<String, Value>>>(raw) {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring unreadable cached table");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn cached_field_list_is_normalized() {
        let fields = decode_cached_field_list("visitor", r#"["phone","email","phone"]"#);
        assert_eq!(fields, Some(vec!["email".to_owned(), "phone".to_owned()]));
    }

    #[test]
    fn unreadable_cache_entries_are_absent() {
        assert_eq!(decode_cached_field_list("visitor", "[\"email\""), None);
        assert_eq!(decode_cached_field_list("visitor", "{\"email\": 1}"), None);
        assert_eq!(decode_cached_field_list("visitor", "null"), None);
        assert_eq!(decode_cached_table("crm", "not json"), None);
    }

    #[test]
    fn cached_table_keeps_values() {
        let table = decode_cached_table("crm", r#"{"email":"x","count":3}"#).expect("table");
        assert_eq!(table.get("email"), Some(&json!("x")));
        assert_eq!(table.get("count"), Some(&json!(3)));
    }
}
