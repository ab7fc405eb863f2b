//! Task endpoints scoped to the authenticated creator.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
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
use crate::web::middleware::CurrentUser;
use crate::web::response::{message_only, success, success_message};
use crate::web::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let schema = FieldSchema::new()
        .field("title", FieldRule::string("Title").required())
        .field("description", FieldRule::long_string("Description").required())
        .field("priority", FieldRule::enumeration("Priority", TaskPriority::ALL))
        .field("due_date", FieldRule::date("Due Date"))
        .field("image", FieldRule::string("Image"));
    let values = validate_body(body_object(&body)?, &schema)?;
    ensure_due_date_not_past(&values)?;

    let mut changes = ChangeSet::new();
    for field in ["title", "description", "priority", "due_date"] {
        if let Some(value) = values.get(field) {
            changes.set(field, value.clone());
        }
    }
    changes.set("image", values.get("image").cloned().unwrap_or(Value::Null));
    changes.set("status", TaskStatus::Todo.as_str());
    changes.set("creator_id", current.id);

    let task = state.tasks.create(&changes).await?;
    Ok(success_message(
        "Task created successfully",
        json!({ "task": task }),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let owned = Filter::new().with("id", id).with("creator_id", current.id);
    let task = state.tasks.fetch_one(&owned, &FetchOpts::default()).await?;
    if task.is_none() {
        return Err(ApiError::not_found(
            "Task not found or does not belong to this user",
        ));
    }

    let schema = FieldSchema::new()
        .field("title", FieldRule::string("Title").required())
        .field("description", FieldRule::string("Description").required())
        .field(
            "priority",
            FieldRule::enumeration("Priority", TaskPriority::ALL).required(),
        )
        .field("due_date", FieldRule::date("Due Date").required())
        .field(
            "status",
            FieldRule::enumeration("Status", TaskStatus::ALL).required(),
        )
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

    let updated = state
        .tasks
        .update(&changes, &Filter::new().with("id", id))
        .await?;
    Ok(success(json!({ "task": updated })))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let owned = Filter::new().with("id", id).with("creator_id", current.id);
    let task = state.tasks.fetch_one(&owned, &FetchOpts::default()).await?;
    if task.is_none() {
        return Err(ApiError::not_found("Task does not belong to this user"));
    }

    let schema =
        FieldSchema::new().field("status", FieldRule::enumeration("Status", TaskStatus::ALL));
    let values = validate_body(body_object(&body)?, &schema)?;

    let mut changes = ChangeSet::new();
    if let Some(status) = values.get("status") {
        changes.set("status", status.clone());
    }
    let updated = state
        .tasks
        .update(&changes, &Filter::new().with("id", id))
        .await?;
    Ok(success(json!({ "task": updated })))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let owned = Filter::new().with("id", id).with("creator_id", current.id);
    let task = state
        .tasks
        .fetch_one(&owned, &FetchOpts::default())
        .await?
        .ok_or_else(|| {
            ApiError::not_found("Task not found or does not belong to this user")
        })?;
    if task.status == TaskStatus::InProgress {
        return Err(ApiError::validation(
            "Task cannot be deleted when it is in progress",
        ));
    }

    state.tasks.delete(&Filter::new().with("id", id)).await?;
    Ok(message_only("Task deleted successfully"))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let owned = Filter::new().with("id", id).with("creator_id", current.id);
    let opts = FetchOpts { include: vec![Include::new("assignee")], ..Default::default() };
    let task = state
        .tasks
        .fetch_one(&owned, &opts)
        .await?
        .ok_or_else(|| ApiError::not_found("task not found"))?;
    Ok(success(json!({ "task": task })))
}

pub async fn get_all(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let query = parse_list_query(&raw, &task_filter_schema(), &task_order_schema());
    let mut filter = Filter::new().with("creator_id", current.id);
    filter.merge(&query.filter);

    let opts = ListOpts {
        include: vec![Include::new("assignee").attributes(USER_REF_ATTRIBUTES)],
        order: query.order,
        limit: Some(query.limit),
        page: query.page,
        ..Default::default()
    };
    let listing = state.tasks.fetch_all(&filter, &opts).await?;
    Ok(success(json!({
        "tasks": listing.data,
        "pagination": listing.pagination,
    })))
}

pub async fn assign(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let owned = Filter::new().with("id", id).with("creator_id", current.id);
    let task = state
        .tasks
        .fetch_one(&owned, &FetchOpts::default())
        .await?
        .ok_or_else(|| ApiError::not_found("Task does not belong to this user"))?;

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
    if assignee.id == current.id {
        return Err(ApiError::validation("user cannot assign task to himself"));
    }
    if task.status == TaskStatus::Completed {
        return Err(ApiError::validation(
            "Task is already completed and cannot be re-assigned",
        ));
    }

    let updated = state
        .tasks
        .update(
            &ChangeSet::new().with("assignee_id", assignee_id),
            &Filter::new().with("id", id),
        )
        .await?;
    tracing::info!(
        assignee_id,
        task_id = id,
        "assignment notification sent"
    );
    Ok(success(json!({
        "task": updated,
        "message": format!(
            "Email notification sent successfully to {} {}",
            assignee.first_name, assignee.last_name
        ),
    })))
}

pub async fn get_assigned(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let query = parse_list_query(&raw, &task_filter_schema(), &task_order_schema());
    let mut filter = Filter::new().with("assignee_id", current.id);
    filter.merge(&query.filter);

    let opts = ListOpts {
        include: vec![Include::new("creator").attributes(USER_REF_ATTRIBUTES)],
        order: query.order,
        limit: Some(query.limit),
        page: query.page,
        ..Default::default()
    };
    let listing = state.tasks.fetch_all(&filter, &opts).await?;
    Ok(success(json!({
        "tasks": listing.data,
        "pagination": listing.pagination,
    })))
}
