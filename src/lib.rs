use std::time::Instant;

use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;
pub mod service;

// Routing segregated by access level (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};
use auth::{AuthUser, TokenService};
use error::AppError;
use policy::Action;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use service::AccountService;

/// ApiDoc
///
/// The OpenAPI document for every route, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::api_root, handlers::signup, handlers::signin,
        handlers::signout, handlers::list_users, handlers::get_user, handlers::update_user,
        handlers::delete_user
    ),
    components(
        schemas(
            models::Role, models::PublicAccount, models::DeletedAccount,
            models::SignupRequest, models::SigninRequest, models::UpdateUserRequest,
            models::AuthResponse, models::UserResponse, models::UsersResponse,
            models::DeleteUserResponse, models::MessageResponse, models::HealthResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "acquisitions-api", description = "User accounts and sessions")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request: the services built around
/// the injected store handle, and the configuration. Nothing here is mutated after
/// startup; the database is the only shared mutable resource.
#[derive(Clone)]
pub struct AppState {
    /// Owns the credential store handle created by the process entry point.
    pub accounts: AccountService,
    pub tokens: TokenService,
    pub config: AppConfig,
    /// Reference point for the uptime reported by `/health`.
    pub started_at: Instant,
}

impl AppState {
    /// Wires the services around an already-constructed store.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            accounts: AccountService::new(repo),
            tokens: TokenService::from_config(&config),
            config,
            started_at: Instant::now(),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless `AuthUser` can be extracted from it.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Authenticates, then rejects non-admin sessions with 403 through the same policy
/// rule the service applies to listing.
async fn admin_middleware(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(denial) = policy::authorize(&auth_user, auth_user.id, Action::List) {
        tracing::warn!(
            actor_id = auth_user.id,
            actor_email = %auth_user.email,
            actor_role = %auth_user.role,
            "Unauthorized access attempt to admin route"
        );
        return Err(AppError::Authorization(denial));
    }
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routing structure, applies scoped and global middleware, and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        .fallback(handlers::not_found)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by `SetRequestIdLayer`
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
