//! Uniform response envelope: `{ success, data?, message? }`.

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

pub fn success(data: impl Serialize) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

pub fn success_message(message: &str, data: impl Serialize) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data,
    }))
}

pub fn message_only(message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
    }))
}
