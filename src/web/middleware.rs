//! Bearer-token and role guards.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::constants::TokenType;
use crate::query::Filter;
use crate::web::auth::verify_token;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

/// The authenticated caller, injected into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
}

/// Validate the bearer token and expose the caller's user id downstream.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    let header = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Authentication required"))?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header);

    let claims = verify_token(token, &state.config.secure_key).map_err(|e| {
        warn!(error = %e, "token rejected");
        ApiError::unauthorized("Invalid or expired token")
    })?;
    if claims.token_type != TokenType::Access {
        return Err(ApiError::unauthorized("Invalid authentication token type"));
    }

    request
        .extensions_mut()
        .insert(CurrentUser { id: claims.user_id });
    Ok(next.run(request).await)
}

/// Only admins pass. Runs behind [`require_auth`], so the extension is
/// always present on a well-formed stack.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .copied()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let user = state
        .users
        .fetch_one(&Filter::new().with("id", current.id), &Default::default())
        .await
        .map_err(ApiError::from)?;
    match user {
        Some(user) if user.is_admin => Ok(next.run(request).await),
        _ => Err(ApiError::forbidden("Permission denied")),
    }
}
