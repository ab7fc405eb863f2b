//! Query-string shaping.
//!
//! Sub-object parameters arrive in bracket form (`q[status]=TODO`,
//! `order[created_at]=ASC`, `q[due_date.gte]=2025-01-01`). This folds the
//! flat key/value pairs into the nested map the query parser expects.

use serde_json::{Map, Value};

/// Fold raw query pairs into a nested map. A repeated key replaces the
/// earlier value.
pub fn query_tree(pairs: &[(String, String)]) -> Map<String, Value> {
    let mut root = Map::new();
    for (key, value) in pairs {
        let path = split_brackets(key);
        insert_path(&mut root, &path, Value::String(value.clone()));
    }
    root
}

/// `q[due_date.gte]` → `["q", "due_date.gte"]`; `a[b][c]` → `["a","b","c"]`.
/// A key with unbalanced brackets is treated as one opaque segment.
fn split_brackets(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if !key.ends_with(']') {
        return vec![key.to_string()];
    }

    let head = &key[..open];
    let mut segments = vec![head.to_string()];
    let mut rest = &key[open..];
    while let Some(close) = rest.find(']') {
        let segment = &rest[1..close];
        if !rest.starts_with('[') || segment.is_empty() {
            return vec![key.to_string()];
        }
        segments.push(segment.to_string());
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        return vec![key.to_string()];
    }
    segments
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [leaf] => {
            map.insert(leaf.clone(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Some(nested) = entry.as_object_mut() {
                insert_path(nested, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn folds_bracketed_keys_into_sub_objects() {
        let tree = query_tree(&pairs(&[
            ("page", "2"),
            ("q[status]", "TODO"),
            ("q[due_date.gte]", "2025-01-01"),
            ("order[created_at]", "ASC"),
        ]));
        assert_eq!(tree.get("page").unwrap(), &json!("2"));
        assert_eq!(
            tree.get("q").unwrap(),
            &json!({"status": "TODO", "due_date.gte": "2025-01-01"})
        );
        assert_eq!(tree.get("order").unwrap(), &json!({"created_at": "ASC"}));
    }

    #[test]
    fn malformed_brackets_stay_opaque() {
        let tree = query_tree(&pairs(&[("q[status", "TODO"), ("q[]", "x")]));
        assert!(tree.contains_key("q[status"));
        assert!(tree.contains_key("q[]"));
    }

    #[test]
    fn repeated_keys_take_the_last_value() {
        let tree = query_tree(&pairs(&[("limit", "10"), ("limit", "25")]));
        assert_eq!(tree.get("limit").unwrap(), &json!("25"));
    }
}
