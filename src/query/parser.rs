//! Schema-validated query parsing.
//!
//! [`parse`] resolves each raw key through the operator grammar, keeps only
//! fields declared by the endpoint's schema, and validates the surviving
//! values with all-errors-collected semantics. Fields absent from the schema
//! and operators illegal for a field's declared type are dropped silently;
//! they never reach the data layer and never produce an error entry.

use serde_json::{Map, Value};

use crate::query::operators::{split_key, PARSER_OPERATORS};
use crate::query::schema::{FieldRule, FieldSchema};

/// Outcome of one parse: `errors` and `values` are disjoint by construction,
/// and every key in `values` traces back to a schema field.
#[derive(Debug, Default)]
pub struct Parsed {
    pub errors: Map<String, Value>,
    pub values: Map<String, Value>,
}

impl Parsed {
    pub fn value_map(&self, key: &str) -> Map<String, Value> {
        self.values
            .get(key)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

/// Validate raw key/value pairs against `schema`. With `include_operators`,
/// operator-suffixed keys (`due_date.gte`) are admitted when the operator is
/// legal for the field's declared type; pattern operators rewrite their value
/// to a wildcarded form before validation.
pub fn parse(raw: &Map<String, Value>, schema: &FieldSchema, include_operators: bool) -> Parsed {
    let mut effective: Vec<(String, &FieldRule, Value)> = Vec::new();

    for (key, value) in raw {
        let (field, operator) = split_key(key, PARSER_OPERATORS);
        let Some(rule) = schema.get(field) else {
            continue;
        };
        match operator {
            None => effective.push((key.clone(), rule, value.clone())),
            Some(op) => {
                if !include_operators {
                    continue;
                }
                let Some(class) = rule.kind.type_class() else {
                    continue;
                };
                if !op.legal_for(class) {
                    continue;
                }
                let value = if op.is_pattern() { wildcard(value) } else { value.clone() };
                effective.push((key.clone(), rule, value));
            }
        }
    }

    let mut parsed = Parsed::default();
    for (key, rule, value) in effective {
        match rule.validate(&value) {
            Ok(clean) => {
                parsed.values.insert(key, clean);
            }
            Err(message) => {
                parsed.errors.insert(key, Value::String(message));
            }
        }
    }
    parsed
}

/// Wrap a pattern-matched value in wildcard markers.
fn wildcard(value: &Value) -> Value {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Value::String(format!("%{raw}%"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::schema::FieldRule;
    use serde_json::json;

    fn task_filter_schema() -> FieldSchema {
        FieldSchema::new()
            .field("priority", FieldRule::string("Priority"))
            .field("status", FieldRule::string("Status"))
            .field("due_date", FieldRule::date("Due Date"))
    }

    fn raw(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn values_are_a_subset_of_the_schema() {
        let query = raw(&[
            ("status", json!("TODO")),
            ("secret_column", json!("x")),
            ("priority", json!("HIGH")),
        ]);
        let parsed = parse(&query, &task_filter_schema(), true);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.values.len(), 2);
        assert!(parsed.values.contains_key("status"));
        assert!(!parsed.values.contains_key("secret_column"));
    }

    #[test]
    fn errors_and_values_are_disjoint() {
        let query = raw(&[
            ("status", json!("TODO")),
            ("due_date", json!("not-a-date")),
        ]);
        let parsed = parse(&query, &task_filter_schema(), true);
        assert_eq!(parsed.values.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors.contains_key("due_date"));
        assert!(!parsed.values.contains_key("due_date"));
    }

    #[test]
    fn like_values_are_wildcarded() {
        let query = raw(&[("status.like", json!("PROGRESS"))]);
        let parsed = parse(&query, &task_filter_schema(), true);
        assert_eq!(parsed.values.get("status.like").unwrap(), &json!("%PROGRESS%"));
    }

    #[test]
    fn illegal_operator_for_type_is_dropped_silently() {
        // `gt` is a range operator; `status` is a text field.
        let query = raw(&[("status.gt", json!("TODO"))]);
        let parsed = parse(&query, &task_filter_schema(), true);
        assert!(parsed.values.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn operators_require_opt_in() {
        let query = raw(&[("due_date.gte", json!("2025-01-01"))]);
        let parsed = parse(&query, &task_filter_schema(), false);
        assert!(parsed.values.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn range_operator_on_date_survives_with_normalized_value() {
        let query = raw(&[("due_date.gte", json!("2025-01-01"))]);
        let parsed = parse(&query, &task_filter_schema(), true);
        assert_eq!(
            parsed.values.get("due_date.gte").unwrap(),
            &json!("2025-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn sub_objects_pass_through_any_rules() {
        let schema = FieldSchema::new()
            .field("q", FieldRule::any("q"))
            .field("page", FieldRule::number("Page"));
        let query = raw(&[
            ("q", json!({"status": "TODO"})),
            ("page", json!("2")),
        ]);
        let parsed = parse(&query, &schema, false);
        assert_eq!(parsed.value_map("q"), raw(&[("status", json!("TODO"))]));
        assert_eq!(parsed.values.get("page").unwrap(), &json!(2));
    }
}
