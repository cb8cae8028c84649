use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Routes that only make sense for administrators. The whole router sits behind
/// `admin_middleware`, which rejects non-admin sessions with 403 before any handler
/// runs; the handlers still go through the policy engine.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/users
        // Lists every account (unpaginated).
        .route("/api/users", get(handlers::list_users))
}
