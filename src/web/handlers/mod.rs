//! HTTP handlers: thin glue from validated request shapes onto the
//! data-access layer.

pub mod admin_tasks;
pub mod auth;
pub mod health;
pub mod leaderboard;
pub mod user_tasks;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::query::order::Direction;
use crate::query::parser::parse;
use crate::query::schema::{FieldRule, FieldSchema};
use crate::query::{Filter, OrderSpec};
use crate::web::errors::ApiError;
use crate::web::params::query_tree;

/// Validated listing parameters shared by every collection endpoint:
/// top-level `page`/`limit`/`q`/`order`, the free-form filter object, and
/// the order object, each validated through its own schema. Parse errors do
/// not fail the request; offending fields simply drop out of the effective
/// query.
pub(crate) struct ListQuery {
    pub filter: Filter,
    pub order: OrderSpec,
    pub page: Option<i64>,
    pub limit: i64,
}

pub(crate) fn parse_list_query(
    raw: &[(String, String)],
    filter_schema: &FieldSchema,
    order_schema: &FieldSchema,
) -> ListQuery {
    let tree = query_tree(raw);
    let top_schema = FieldSchema::new()
        .field("q", FieldRule::any("q"))
        .field("order", FieldRule::any("order"))
        .field("page", FieldRule::number("Page"))
        .field("limit", FieldRule::number("Limit"));
    let params = parse(&tree, &top_schema, false);

    let query = parse(&params.value_map("q"), filter_schema, true);
    let filter = Filter::from_values(&query.values);

    let order_values = parse(&params.value_map("order"), order_schema, false);
    let mut order = OrderSpec::from_values(&order_values.values);
    order.set("id", Direction::Desc);

    ListQuery {
        filter,
        order,
        page: params.values.get("page").and_then(Value::as_i64),
        limit: params
            .values
            .get("limit")
            .and_then(Value::as_i64)
            .unwrap_or(10),
    }
}

/// Filter vocabulary shared by the task listing and leaderboard endpoints.
pub(crate) fn task_filter_schema() -> FieldSchema {
    FieldSchema::new()
        .field("priority", FieldRule::string("Priority"))
        .field("status", FieldRule::string("Status"))
        .field("due_date", FieldRule::date("Due Date"))
}

pub(crate) fn task_order_schema() -> FieldSchema {
    FieldSchema::new()
        .field("id", FieldRule::enumeration("id", &["ASC", "DESC"]))
        .field("created_at", FieldRule::enumeration("created_at", &["ASC", "DESC"]))
}

/// Projection used when a task listing embeds its counterpart user.
pub(crate) const USER_REF_ATTRIBUTES: &[&str] =
    &["id", "first_name", "last_name", "is_admin", "is_regular"];

pub(crate) fn body_object(body: &Value) -> Result<&Map<String, Value>, ApiError> {
    body.as_object()
        .ok_or_else(|| ApiError::validation("Request body must be an object"))
}

/// Reject due dates in the past; absent dates pass.
pub(crate) fn ensure_due_date_not_past(values: &Map<String, Value>) -> Result<(), ApiError> {
    if let Some(raw) = values.get("due_date").and_then(Value::as_str) {
        let due = DateTime::parse_from_rfc3339(raw)
            .map_err(|_| ApiError::validation("\"Due Date\" must be a valid date"))?;
        if due.with_timezone(&Utc) < Utc::now() {
            return Err(ApiError::validation("Due date cannot be in the past"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn list_query_applies_defaults() {
        let query = parse_list_query(&pairs(&[]), &task_filter_schema(), &task_order_schema());
        assert!(query.filter.is_empty());
        assert_eq!(query.limit, 10);
        assert_eq!(query.page, None);
        assert_eq!(query.order.to_sql("tasks"), vec![r#""tasks"."id" DESC"#]);
    }

    #[test]
    fn list_query_threads_filters_and_order() {
        let raw = pairs(&[
            ("q[status]", "TODO"),
            ("q[due_date.gte]", "2025-06-01"),
            ("order[created_at]", "ASC"),
            ("page", "2"),
            ("limit", "5"),
        ]);
        let query = parse_list_query(&raw, &task_filter_schema(), &task_order_schema());
        let conditions = query.filter.conditions("tasks");
        assert!(conditions.contains(&r#""tasks"."status" = 'TODO'"#.to_string()));
        assert!(conditions
            .contains(&r#""tasks"."due_date" >= '2025-06-01T00:00:00+00:00'"#.to_string()));
        assert_eq!(
            query.order.to_sql("tasks"),
            vec![r#""tasks"."created_at" ASC"#, r#""tasks"."id" DESC"#]
        );
        assert_eq!(query.page, Some(2));
        assert_eq!(query.limit, 5);
    }

    #[test]
    fn default_order_overrides_a_caller_supplied_id_direction() {
        let raw = pairs(&[("order[id]", "ASC")]);
        let query = parse_list_query(&raw, &task_filter_schema(), &task_order_schema());
        assert_eq!(query.order.to_sql("tasks"), vec![r#""tasks"."id" DESC"#]);
    }

    #[test]
    fn undeclared_filter_fields_never_reach_the_filter() {
        let raw = pairs(&[("q[creator_id]", "1"), ("q[status]", "TODO")]);
        let query = parse_list_query(&raw, &task_filter_schema(), &task_order_schema());
        let conditions = query.filter.conditions("tasks");
        assert_eq!(conditions, vec![r#""tasks"."status" = 'TODO'"#.to_string()]);
    }
}
