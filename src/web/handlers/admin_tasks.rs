//! Task endpoints with admin-wide scope: no creator ownership constraint,
//! partial updates, and assignment on behalf of any creator.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::constants::{TaskPriority, TaskStatus};
use crate::dao::{ChangeSet, FetchOpts, ListOpts};
use crate::query::schema::{validate_body, FieldRule, FieldSchema};
use crate::query::{Filter, Include};
use crate::web::errors::ApiError;
use crate::web::handlers::{
    body_object, ensure_due_date_not_past, parse_list_query, task_filter_schema,
    task_order_schema, USER_REF_ATTRIBUTES,
};
use crate::web::response::{message_only, success};
use crate::web::state::AppState;

fn both_parties() -> Vec<Include> {
    vec![
        Include::new("creator").attributes(USER_REF_ATTRIBUTES),
        Include::new("assignee").attributes(USER_REF_ATTRIBUTES),
    ]
}

pub async fn get_all(
    State(state): State<AppState>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let query = parse_list_query(&raw, &task_filter_schema(), &task_order_schema());
    let opts = ListOpts {
        include: both_parties(),
        order: query.order,
        limit: Some(query.limit),
        page: query.page,
        ..Default::default()
    };
    let listing = state.tasks.fetch_all(&query.filter, &opts).await?;
    Ok(success(json!({
        "tasks": listing.data,
        "pagination": listing.pagination,
    })))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let opts = FetchOpts { include: both_parties(), ..Default::default() };
    let task = state
        .tasks
        .fetch_one(&Filter::new().with("id", id), &opts)
        .await?
        .ok_or_else(|| ApiError::not_found("task not found"))?;
    Ok(success(json!({ "task": task })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::new().with("id", id);
    state
        .tasks
        .fetch_one(&filter, &FetchOpts::default())
        .await?
        .ok_or_else(|| ApiError::not_found("Not found"))?;

    state.tasks.delete(&filter).await?;
    Ok(message_only("Task deleted successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::new().with("id", id);
    state
        .tasks
        .fetch_one(&filter, &FetchOpts::default())
        .await?
        .ok_or_else(|| ApiError::not_found("Not found"))?;

    let schema = FieldSchema::new()
        .field("title", FieldRule::string("Title"))
        .field("description", FieldRule::string("Description"))
        .field("priority", FieldRule::enumeration("Priority", TaskPriority::ALL))
        .field("due_date", FieldRule::date("Due Date"))
        .field("status", FieldRule::enumeration("Status", TaskStatus::ALL))
        .field("image", FieldRule::string("Image"));
    let values = validate_body(body_object(&body)?, &schema)?;
    ensure_due_date_not_past(&values)?;

    let mut changes = ChangeSet::new();
    for field in ["title", "description", "priority", "due_date", "status"] {
        if let Some(value) = values.get(field) {
            changes.set(field, value.clone());
        }
    }
    changes.set("image", values.get("image").cloned().unwrap_or(Value::Null));

    let updated = state.tasks.update(&changes, &filter).await?;
    Ok(success(json!({ "task": updated })))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::new().with("id", id);
    state
        .tasks
        .fetch_one(&filter, &FetchOpts::default())
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    let schema =
        FieldSchema::new().field("status", FieldRule::enumeration("Status", TaskStatus::ALL));
    let values = validate_body(body_object(&body)?, &schema)?;

    let mut changes = ChangeSet::new();
    if let Some(status) = values.get("status") {
        changes.set("status", status.clone());
    }
    let updated = state.tasks.update(&changes, &filter).await?;
    Ok(success(json!({ "task": updated })))
}

pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::new().with("id", id);
    let task = state
        .tasks
        .fetch_one(&filter, &FetchOpts::default())
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    let schema =
        FieldSchema::new().field("assignee_id", FieldRule::number("Assignee ID").required());
    let values = validate_body(body_object(&body)?, &schema)?;
    let assignee_id = values["assignee_id"].as_i64().unwrap_or_default();

    let assignee = state
        .users
        .fetch_one(
            &Filter::new().with("id", assignee_id).with("is_regular", true),
            &FetchOpts::default(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("user does not exist"))?;
    if assignee.id == task.creator_id {
        return Err(ApiError::validation(
            "You cannot assign task to the original creator of this task",
        ));
    }
    if task.status == TaskStatus::Completed {
        return Err(ApiError::validation(
            "Task is already completed and cannot be re-assigned",
        ));
    }

    let updated = state
        .tasks
        .update(&ChangeSet::new().with("assignee_id", assignee_id), &filter)
        .await?;
    tracing::info!(assignee_id, task_id = id, "assignment notification sent");
    Ok(success(json!({
        "task": updated,
        "message": format!(
            "Email notification sent successfully to {} {}",
            assignee.first_name, assignee.last_name
        ),
    })))
}

/// Tasks currently assigned to one user, with both parties embedded in
/// their default projections.
pub async fn assigned_to_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    state
        .users
        .fetch_one(&Filter::new().with("id", id), &FetchOpts::default())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let query = parse_list_query(&raw, &task_filter_schema(), &task_order_schema());
    let opts = ListOpts {
        include: vec![Include::new("creator"), Include::new("assignee")],
        order: query.order,
        limit: Some(query.limit),
        page: query.page,
        ..Default::default()
    };
    let listing = state
        .tasks
        .fetch_all(&Filter::new().with("assignee_id", id), &opts)
        .await?;
    Ok(success(json!({
        "tasks": listing.data,
        "pagination": listing.pagination,
    })))
}
