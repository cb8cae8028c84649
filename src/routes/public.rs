use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session. Signup and signin are the only ways to obtain one.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe with a timestamp and process uptime.
        .route("/health", get(handlers::health))
        // GET /api
        // Banner confirming the API is mounted.
        .route("/api", get(handlers::api_root))
        // POST /api/auth/signup
        // Creates an account (role defaults to `user`) and sets the session cookie.
        .route("/api/auth/signup", post(handlers::signup))
        // POST /api/auth/signin
        // Verifies credentials and sets the session cookie.
        .route("/api/auth/signin", post(handlers::signin))
        // POST /api/auth/signout
        // Clears the session cookie.
        .route("/api/auth/signout", post(handlers::signout))
}
