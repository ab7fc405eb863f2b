//! # HTTP Surface
//!
//! Axum router, guards, and handlers. Controllers stay thin: they validate
//! request shapes through the query/schema layer, call the injected
//! accessors, and map failure categories onto status codes. All persistence
//! behavior lives below the [`crate::dao`] boundary.

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod params;
pub mod response;
pub mod state;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::web::middleware::{require_admin, require_auth};
use crate::web::state::AppState;

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_tasks = Router::new()
        .route("/", get(handlers::user_tasks::get_all))
        .route("/create", post(handlers::user_tasks::create))
        .route("/assign-tasks", get(handlers::user_tasks::get_assigned))
        .route("/{id}/update", put(handlers::user_tasks::update))
        .route("/{id}/update-status", put(handlers::user_tasks::update_status))
        .route("/{id}/delete", delete(handlers::user_tasks::remove))
        .route("/{id}", get(handlers::user_tasks::get_one))
        .route("/{id}/assign", post(handlers::user_tasks::assign));
    let user_routes = Router::new()
        .nest("/tasks", user_tasks)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let admin_tasks = Router::new()
        .route("/", get(handlers::admin_tasks::get_all))
        .route("/{id}/update", put(handlers::admin_tasks::update))
        .route("/{id}/update-status", put(handlers::admin_tasks::update_status))
        .route("/{id}/delete", delete(handlers::admin_tasks::remove))
        .route("/{id}", get(handlers::admin_tasks::get_one))
        .route("/{id}/assign", post(handlers::admin_tasks::assign))
        .route(
            "/users/{id}/assign-tasks",
            get(handlers::admin_tasks::assigned_to_user),
        );
    // Guards run outside-in: bearer auth first, then the role check.
    let admin_routes = Router::new()
        .nest("/tasks", admin_tasks)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health::check))
        .nest("/v1/auth", auth_routes)
        .route("/v1/leaderboard", get(handlers::leaderboard::rank_summary))
        .nest("/v1/user", user_routes)
        .nest("/v1/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
