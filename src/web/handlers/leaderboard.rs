//! Completion-rate leaderboard.

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::dao::task::LeaderboardOpts;
use crate::query::parser::parse;
use crate::query::schema::{FieldRule, FieldSchema};
use crate::query::Filter;
use crate::web::errors::ApiError;
use crate::web::handlers::task_filter_schema;
use crate::web::params::query_tree;
use crate::web::response::success;
use crate::web::state::AppState;

pub async fn rank_summary(
    State(state): State<AppState>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let tree = query_tree(&raw);
    let top_schema = FieldSchema::new()
        .field("q", FieldRule::any("q"))
        .field("page", FieldRule::number("Page"))
        .field("limit", FieldRule::number("Limit"));
    let params = parse(&tree, &top_schema, false);

    let query = parse(&params.value_map("q"), &task_filter_schema(), true);
    let filter = Filter::from_values(&query.values);

    let opts = LeaderboardOpts {
        limit: Some(
            params
                .values
                .get("limit")
                .and_then(Value::as_i64)
                .unwrap_or(10),
        ),
        page: params.values.get("page").and_then(Value::as_i64),
        ..Default::default()
    };
    let page = state.tasks.completion_leaderboard(&filter, &opts).await?;
    Ok(success(json!({
        "leaderboard": page.data,
        "pagination": page.pagination,
    })))
}
