//! Route definitions for the sessiond HTTP API.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(admin_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Health and auth endpoints.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
}

/// Admin endpoints behind the `X-Admin-Token` guard.
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/admin/users/{id}/sessions",
            get(handlers::admin::list_sessions),
        )
        .route("/admin/users/{id}/kick", post(handlers::admin::kick))
        .route("/admin/users/{id}/ban", post(handlers::admin::ban))
        .route("/admin/users/{id}/unban", post(handlers::admin::unban))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::admin::require_admin,
        ))
}
