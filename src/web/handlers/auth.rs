//! Registration and login.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::constants::TokenType;
use crate::dao::ChangeSet;
use crate::query::schema::{validate_body, FieldRule, FieldSchema};
use crate::query::Filter;
use crate::web::auth::{hash_password, issue_token, verify_password};
use crate::web::errors::ApiError;
use crate::web::handlers::body_object;
use crate::web::response::success_message;
use crate::web::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let schema = FieldSchema::new()
        .field("first_name", FieldRule::string("First name").required())
        .field("last_name", FieldRule::string("Last name").required())
        .field("email", FieldRule::email("Email").required())
        .field("password", FieldRule::password("Password").required())
        .field(
            "role",
            FieldRule::enumeration("Role", &["REGULAR", "ADMIN"]).required(),
        );
    let values = validate_body(body_object(&body)?, &schema)?;

    let email = values["email"].as_str().unwrap_or_default().to_string();
    let email_taken = state
        .users
        .exist(&Filter::new().with("email", email.clone()))
        .await?;
    if email_taken {
        return Err(ApiError::validation(
            "User with this email address already exists",
        ));
    }

    let is_admin = values["role"].as_str() == Some("ADMIN");
    let password_hash = hash_password(values["password"].as_str().unwrap_or_default())?;

    let changes = ChangeSet::new()
        .with("first_name", values["first_name"].clone())
        .with("last_name", values["last_name"].clone())
        .with("email", email)
        .with("password", password_hash)
        .with("is_regular", !is_admin)
        .with("is_admin", is_admin);
    let user = state.users.create(&changes).await?;

    let token = issue_token(user.id, TokenType::Verify, &state.config)?;
    Ok(success_message(
        "Signup successful",
        json!({ "user": user, "token": token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let schema = FieldSchema::new()
        .field("email", FieldRule::email("Email").required())
        .field("password", FieldRule::password("Password").required());
    let values = validate_body(body_object(&body)?, &schema)?;

    let email = values["email"].as_str().unwrap_or_default();
    let fetched = state
        .users
        .fetch_one(
            &Filter::new().with("email", email),
            &crate::dao::FetchOpts { scope: Some("with_password"), ..Default::default() },
        )
        .await?;
    let Some(fetched) = fetched else {
        return Err(ApiError::unauthorized(
            "No account associated with this email address",
        ));
    };

    let stored = fetched.password.as_deref().unwrap_or_default();
    let supplied = values["password"].as_str().unwrap_or_default();
    if !verify_password(supplied, stored) {
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let mut user = fetched.record;
    user.password = None;
    let access_token = issue_token(user.id, TokenType::Access, &state.config)?;
    Ok(success_message(
        "Login successful",
        json!({ "user": user, "access_token": access_token }),
    ))
}
