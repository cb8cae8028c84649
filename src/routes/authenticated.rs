use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes reachable by any holder of a valid session. Whether the actor may read,
/// change or remove the particular account is decided per request by the policy engine:
/// owner or admin for reads and updates, admin-but-not-self for deletion.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PUT/DELETE /api/users/{id}
        .route(
            "/api/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
