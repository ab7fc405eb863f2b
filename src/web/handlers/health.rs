//! Liveness probe; unauthenticated.

use axum::Json;
use serde_json::{json, Value};

use crate::web::response::success;

pub async fn check() -> Json<Value> {
    success(json!({ "status": "healthy" }))
}
