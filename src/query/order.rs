//! Ordered sort terms.
//!
//! Term order is significant (primary sort first), so this is a sequence,
//! not a map. Setting a column that is already present replaces its direction
//! in place, mirroring how callers layer a default order over user input.

use serde_json::{Map, Value};
use std::str::FromStr;

use crate::query::filter::quote_ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OrderTarget {
    Column(String),
    Related { relation: String, column: String },
}

#[derive(Debug, Clone)]
pub struct OrderTerm {
    target: OrderTarget,
    direction: Direction,
}

#[derive(Debug, Clone, Default)]
pub struct OrderSpec {
    terms: Vec<OrderTerm>,
}

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Add or update a base-table term; an existing term keeps its position.
    pub fn set(&mut self, column: impl Into<String>, direction: Direction) {
        let target = OrderTarget::Column(column.into());
        self.upsert(target, direction);
    }

    pub fn with(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.set(column, direction);
        self
    }

    /// Add or update a term addressing a joined relation's column.
    pub fn set_related(
        &mut self,
        relation: impl Into<String>,
        column: impl Into<String>,
        direction: Direction,
    ) {
        let target = OrderTarget::Related { relation: relation.into(), column: column.into() };
        self.upsert(target, direction);
    }

    fn upsert(&mut self, target: OrderTarget, direction: Direction) {
        match self.terms.iter_mut().find(|term| term.target == target) {
            Some(term) => term.direction = direction,
            None => self.terms.push(OrderTerm { target, direction }),
        }
    }

    /// Build from validated parser output: `{"created_at": "ASC"}` for base
    /// columns, `{"assignee": ["first_name", "DESC"]}` for related columns.
    /// Entries with an unrecognized shape are skipped.
    pub fn from_values(values: &Map<String, Value>) -> Self {
        let mut spec = OrderSpec::new();
        for (key, value) in values {
            match value {
                Value::String(dir) => {
                    if let Ok(direction) = dir.parse() {
                        spec.set(key.clone(), direction);
                    }
                }
                Value::Array(pair) => {
                    if let [Value::String(column), Value::String(dir)] = pair.as_slice() {
                        if let Ok(direction) = dir.parse() {
                            spec.set_related(key.clone(), column.clone(), direction);
                        }
                    }
                }
                _ => {}
            }
        }
        spec
    }

    /// Render ORDER BY terms, qualifying base columns against `table` and
    /// related terms against their relation alias.
    pub fn to_sql(&self, table: &str) -> Vec<String> {
        self.terms
            .iter()
            .map(|term| match &term.target {
                OrderTarget::Column(column) => format!(
                    "{}.{} {}",
                    quote_ident(table),
                    quote_ident(column),
                    term.direction.as_sql()
                ),
                OrderTarget::Related { relation, column } => format!(
                    "{}.{} {}",
                    quote_ident(relation),
                    quote_ident(column),
                    term.direction.as_sql()
                ),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terms_render_in_insertion_order() {
        let spec = OrderSpec::new()
            .with("created_at", Direction::Asc)
            .with("id", Direction::Desc);
        assert_eq!(
            spec.to_sql("tasks"),
            vec![r#""tasks"."created_at" ASC"#, r#""tasks"."id" DESC"#]
        );
    }

    #[test]
    fn upsert_replaces_direction_in_place() {
        let mut spec = OrderSpec::new()
            .with("id", Direction::Asc)
            .with("created_at", Direction::Asc);
        spec.set("id", Direction::Desc);
        assert_eq!(
            spec.to_sql("tasks"),
            vec![r#""tasks"."id" DESC"#, r#""tasks"."created_at" ASC"#]
        );
    }

    #[test]
    fn related_terms_qualify_against_the_alias() {
        let mut spec = OrderSpec::new();
        spec.set_related("assignee", "first_name", Direction::Asc);
        assert_eq!(spec.to_sql("tasks"), vec![r#""assignee"."first_name" ASC"#]);
    }

    #[test]
    fn builds_from_parser_values() {
        let mut values = Map::new();
        values.insert("created_at".to_string(), json!("ASC"));
        values.insert("assignee".to_string(), json!(["last_name", "DESC"]));
        values.insert("broken".to_string(), json!(42));
        let spec = OrderSpec::from_values(&values);
        assert_eq!(
            spec.to_sql("tasks"),
            vec![r#""tasks"."created_at" ASC"#, r#""assignee"."last_name" DESC"#]
        );
    }
}
