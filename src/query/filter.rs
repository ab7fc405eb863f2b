//! Ordered predicate sets and their WHERE translation.
//!
//! A [`Filter`] is a flat, insertion-ordered key/value set. Keys follow the
//! operator grammar (`status`, `due_date.gte`, `assignee.first_name.not`);
//! values are plain scalars, arrays (membership), or null. Translation merges
//! same-field pairs into one AND-ed compound condition and rewrites joined
//! paths to alias-qualified column references.

use serde_json::{Map, Value};

use crate::query::operators::{split_key, Operator, WHERE_OPERATORS};

#[derive(Debug, Clone, Default)]
pub struct Filter {
    entries: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert semantics: a repeated key replaces the value in place, keeping
    /// its original position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Absorb validated parser output.
    pub fn extend(&mut self, values: &Map<String, Value>) {
        for (key, value) in values {
            self.set(key.clone(), value.clone());
        }
    }

    /// Layer another filter on top of this one, upserting key by key.
    pub fn merge(&mut self, other: &Filter) {
        for (key, value) in other.iter() {
            self.set(key.to_string(), value.clone());
        }
    }

    pub fn from_values(values: &Map<String, Value>) -> Self {
        let mut filter = Filter::new();
        filter.extend(values);
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Translate into WHERE condition fragments against `table`. Same-field
    /// pairs with different operators merge into one parenthesized AND group;
    /// the unqualified operator defaults to equality.
    pub fn conditions(&self, table: &str) -> Vec<String> {
        let mut groups: Vec<(String, Vec<(Operator, Value)>)> = Vec::new();
        for (key, value) in self.iter() {
            let (field, operator) = split_key(key, WHERE_OPERATORS);
            let operator = operator.unwrap_or(Operator::Eq);
            let column = column_ref(field, table);
            match groups.iter_mut().find(|(c, _)| *c == column) {
                Some((_, ops)) => ops.push((operator, value.clone())),
                None => groups.push((column, vec![(operator, value.clone())])),
            }
        }

        groups
            .into_iter()
            .map(|(column, ops)| {
                let parts: Vec<String> = ops
                    .iter()
                    .map(|(op, value)| condition_sql(&column, *op, value))
                    .collect();
                match parts.as_slice() {
                    [single] => single.clone(),
                    _ => format!("({})", parts.join(" AND ")),
                }
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut filter = Filter::new();
        for (key, value) in iter {
            filter.set(key, value);
        }
        filter
    }
}

/// Resolve a field path to a qualified column reference. A path containing a
/// separator refers into a joined relation and resolves against the join
/// alias instead of the primary table.
fn column_ref(field: &str, table: &str) -> String {
    match field.rsplit_once('.') {
        Some((alias, column)) => format!("{}.{}", quote_ident(alias), quote_ident(column)),
        None => format!("{}.{}", quote_ident(table), quote_ident(field)),
    }
}

fn condition_sql(column: &str, operator: Operator, value: &Value) -> String {
    match (operator, value) {
        (Operator::Eq, Value::Array(items)) => format!("{column} IN ({})", value_list(items)),
        (Operator::Not, Value::Array(items)) => {
            format!("{column} NOT IN ({})", value_list(items))
        }
        (Operator::Eq, Value::Null) => format!("{column} IS NULL"),
        (Operator::Not, Value::Null) => format!("{column} IS NOT NULL"),
        _ => format!("{column} {} {}", operator.sql(), format_value(value)),
    }
}

fn value_list(items: &[Value]) -> String {
    items.iter().map(format_value).collect::<Vec<_>>().join(", ")
}

/// Render a scalar as a SQL literal.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        _ => format!("'{}'", value.to_string().replace('\'', "''")),
    }
}

/// Quote an identifier, stripping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_key_defaults_to_equality() {
        let filter = Filter::new().with("status", "TODO");
        assert_eq!(filter.conditions("tasks"), vec![r#""tasks"."status" = 'TODO'"#]);
    }

    #[test]
    fn same_field_operators_merge_into_one_condition() {
        let filter = Filter::new().with("age.gte", 18).with("age.lt", 65);
        assert_eq!(
            filter.conditions("users"),
            vec![r#"("users"."age" >= 18 AND "users"."age" < 65)"#]
        );
    }

    #[test]
    fn joined_paths_qualify_against_the_relation_alias() {
        let filter = Filter::new().with("assignee.first_name.not", "Bill");
        assert_eq!(
            filter.conditions("tasks"),
            vec![r#""assignee"."first_name" <> 'Bill'"#]
        );
    }

    #[test]
    fn arrays_render_as_membership() {
        let filter = Filter::new().with("id", json!([1, 2, 3]));
        assert_eq!(filter.conditions("tasks"), vec![r#""tasks"."id" IN (1, 2, 3)"#]);
    }

    #[test]
    fn null_equality_renders_is_null() {
        let filter = Filter::new()
            .with("assignee_id", Value::Null)
            .with("image.not", Value::Null);
        assert_eq!(
            filter.conditions("tasks"),
            vec![
                r#""tasks"."assignee_id" IS NULL"#,
                r#""tasks"."image" IS NOT NULL"#
            ]
        );
    }

    #[test]
    fn repeated_key_replaces_in_place() {
        let mut filter = Filter::new().with("status", "TODO").with("priority", "LOW");
        filter.set("status", "COMPLETED");
        let conditions = filter.conditions("tasks");
        assert_eq!(conditions[0], r#""tasks"."status" = 'COMPLETED'"#);
        assert_eq!(conditions[1], r#""tasks"."priority" = 'LOW'"#);
    }

    #[test]
    fn string_values_escape_quotes() {
        assert_eq!(format_value(&json!("O'Brien")), "'O''Brien'");
    }
}
