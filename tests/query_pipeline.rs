//! End-to-end exercise of the request-to-SQL pipeline: raw query pairs are
//! shaped, validated against a schema, and composed into a SELECT with
//! deterministic ordering and pagination.

use serde_json::json;
use taskdeck::query::page::{offset, PageInfo};
use taskdeck::query::parser::parse;
use taskdeck::query::schema::{FieldRule, FieldSchema};
use taskdeck::query::{Direction, Filter, OrderSpec, SelectStatement};
use taskdeck::web::params::query_tree;

fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn task_schema() -> FieldSchema {
    FieldSchema::new()
        .field("priority", FieldRule::string("Priority"))
        .field("status", FieldRule::string("Status"))
        .field("due_date", FieldRule::date("Due Date"))
}

#[test]
fn filters_survive_the_whole_pipeline() {
    let tree = query_tree(&pairs(&[
        ("q[status]", "TODO"),
        ("q[priority.not]", "LOW"),
        ("q[due_date.gte]", "2025-01-01"),
        ("q[creator_id]", "9"),
    ]));
    let q = tree.get("q").and_then(|v| v.as_object()).cloned().unwrap();
    let parsed = parse(&q, &task_schema(), true);
    assert!(parsed.errors.is_empty());
    // creator_id is not part of the schema, so it never reaches the filter.
    assert_eq!(parsed.values.len(), 3);

    let filter = Filter::from_values(&parsed.values);
    let mut stmt = SelectStatement::new("tasks")
        .columns(vec![r#""tasks"."id""#.to_string()]);
    stmt.push_wheres(filter.conditions("tasks"));
    let sql = stmt.build_sql();

    assert!(sql.contains(r#""tasks"."status" = 'TODO'"#));
    assert!(sql.contains(r#""tasks"."priority" <> 'LOW'"#));
    assert!(sql.contains(r#""tasks"."due_date" >= '2025-01-01T00:00:00+00:00'"#));
    assert!(!sql.contains("creator_id"));
}

#[test]
fn pattern_operators_reach_sql_wildcarded() {
    let raw: serde_json::Map<String, serde_json::Value> =
        [("status.like".to_string(), json!("PROGRESS"))]
            .into_iter()
            .collect();
    let parsed = parse(&raw, &task_schema(), true);
    let filter = Filter::from_values(&parsed.values);
    assert_eq!(
        filter.conditions("tasks"),
        vec![r#""tasks"."status" LIKE '%PROGRESS%'"#]
    );
}

#[test]
fn page_two_of_twenty_five_rows() {
    // 25 matching rows, 10 per page: page 2 selects rows 11-20.
    let limit = 10;
    let page = 2;
    let stmt = SelectStatement::new("tasks")
        .columns(vec![r#""tasks"."id""#.to_string()])
        .order_by(OrderSpec::new().with("id", Direction::Desc).to_sql("tasks"))
        .limit(limit)
        .offset(offset(page, limit));
    let sql = stmt.build_sql();
    assert!(sql.ends_with("LIMIT 10 OFFSET 10"));

    let info = PageInfo::compute(limit, page, 25);
    assert_eq!(info, PageInfo { limit: 10, page: 2, pages: 3, rows: 25 });
}
