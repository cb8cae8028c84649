use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{AppError, ErrorResponse},
    extractors::{UserId, ValidatedJson},
    models::{
        AuthResponse, DeleteUserResponse, HealthResponse, MessageResponse, SigninRequest,
        SignupRequest, UpdateUserRequest, UserResponse, UsersResponse,
    },
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

// --- Public Handlers ---

/// health
///
/// [Public Route] Liveness probe for load balancers and monitoring.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

/// api_root
///
/// [Public Route] Confirms the API is mounted.
#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "API banner", body = MessageResponse))
)]
pub async fn api_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Acquisitions API is running!".to_string(),
    })
}

/// signup
///
/// [Public Route] Registers an account and opens a session for it.
/// The session token is set as an HTTP-only cookie; it is not part of the body.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let user = state.accounts.register(payload).await?;
    let token = state.tokens.sign(&user)?;
    let jar = jar.add(auth::session_cookie(token, state.config.secure_cookies()));

    tracing::info!(email = %user.email, "User signed up successfully");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered".to_string(),
            user,
        }),
    ))
}

/// signin
///
/// [Public Route] Checks credentials and opens a session.
/// Unknown email and wrong password are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SigninRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let user = state
        .accounts
        .authenticate(&payload.email, payload.password)
        .await?;
    let token = state.tokens.sign(&user)?;
    let jar = jar.add(auth::session_cookie(token, state.config.secure_cookies()));

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

/// signout
///
/// [Public Route] Clears the session cookie, whether or not the request carried one.
/// Stateless sessions mean the token itself stays valid until it expires; only the
/// client's copy is dropped.
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses((status = 200, description = "Logout successful", body = MessageResponse))
)]
pub async fn signout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    tracing::info!("User signed out successfully");
    (
        jar.add(auth::cleared_session_cookie()),
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

/// not_found
///
/// Fallback for every unmatched route.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::route_not_found(uri.path())
}

// --- Authenticated Handlers ---

/// list_users
///
/// [Admin Route] Lists every account. No pagination.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = UsersResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    )
)]
pub async fn list_users(
    actor: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UsersResponse>, AppError> {
    let users = state.accounts.list(&actor).await?;
    Ok(Json(UsersResponse {
        message: "Successfully retrieved users".to_string(),
        count: users.len(),
        users,
    }))
}

/// get_user
///
/// [Authenticated Route] Reads one account. Owner or admin.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Bad id", body = ErrorResponse),
        (status = 403, description = "Neither owner nor admin", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    actor: AuthUser,
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.accounts.get_as(id, &actor).await?;
    Ok(Json(UserResponse {
        message: "Successfully retrieved user".to_string(),
        user,
    }))
}

/// update_user
///
/// [Authenticated Route] Partially updates an account.
///
/// *Authorization*: owner or admin; only an admin may change a role, and never their own.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Denied by policy", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Email in use", body = ErrorResponse)
    )
)]
pub async fn update_user(
    actor: AuthUser,
    State(state): State<AppState>,
    UserId(id): UserId,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.accounts.update(id, &actor, payload).await?;
    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

/// delete_user
///
/// [Admin Route] Deletes another account. An admin cannot delete themselves.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = DeleteUserResponse),
        (status = 403, description = "Not an admin, or self-deletion", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    actor: AuthUser,
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<Json<DeleteUserResponse>, AppError> {
    let deleted_user = state.accounts.remove(id, &actor).await?;
    Ok(Json(DeleteUserResponse {
        message: "User deleted successfully".to_string(),
        deleted_user,
    }))
}
