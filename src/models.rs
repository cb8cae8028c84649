use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::Validate;

use crate::policy::AccountField;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The closed set of roles. Mapped onto the `user_role` Postgres enum so that an
/// out-of-range value can reach neither the handlers nor the table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account
///
/// A full row of the `users` table, password hash included. This type never leaves the
/// service layer; everything sent to a client goes through [`PublicAccount`].
#[derive(Clone, FromRow)]
pub struct Account {
    pub id: i32,
    pub name: String,
    // Stored trimmed and lowercased.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// PublicAccount
///
/// The hash-free projection of an account returned by every read and write endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PublicAccount {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for PublicAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// DeletedAccount
///
/// What is echoed back after a deletion: identity and role only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeletedAccount {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<Account> for DeletedAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
        }
    }
}

/// Insert payload handed to the repository once the password is hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// AccountChanges
///
/// Partial update handed to the repository. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

// --- Request Payloads (Input Schemas) ---

/// Normalize
///
/// Canonicalizes a request before its validation rules run (trimming, email case).
pub trait Normalize {
    fn normalize(self) -> Self;
}

fn normalize_email(email: String) -> String {
    email.trim().to_lowercase()
}

/// SignupRequest
///
/// Input payload for POST /api/auth/signup. `role` defaults to `user` when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must not exceed 255 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    pub password: String,
    #[serde(default)]
    #[ts(optional)]
    pub role: Option<Role>,
}

impl Normalize for SignupRequest {
    fn normalize(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(self.email),
            ..self
        }
    }
}

/// SigninRequest
///
/// Input payload for POST /api/auth/signin.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl Normalize for SigninRequest {
    fn normalize(self) -> Self {
        Self {
            email: normalize_email(self.email),
            ..self
        }
    }
}

/// UpdateUserRequest
///
/// Partial update payload for PUT /api/users/{id}. An empty body is rejected by the
/// service; which fields the caller may actually touch is decided by the policy engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 255, message = "Name must be between 2 and 255 characters"))]
    #[ts(optional)]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must not exceed 255 characters")
    )]
    #[ts(optional)]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    #[ts(optional)]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    /// The set of fields this request asks to change.
    pub fn fields(&self) -> Vec<AccountField> {
        let mut fields = Vec::with_capacity(4);
        if self.name.is_some() {
            fields.push(AccountField::Name);
        }
        if self.email.is_some() {
            fields.push(AccountField::Email);
        }
        if self.password.is_some() {
            fields.push(AccountField::Password);
        }
        if self.role.is_some() {
            fields.push(AccountField::Role);
        }
        fields
    }
}

impl Normalize for UpdateUserRequest {
    fn normalize(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email: self.email.map(normalize_email),
            ..self
        }
    }
}

// --- Response Payloads (Output Schemas) ---

/// AuthResponse
///
/// Body of a successful signup or signin. The session token travels in the cookie only.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserResponse {
    pub message: String,
    pub user: PublicAccount,
}

/// UsersResponse
///
/// Admin listing. Unpaginated: the whole table is returned.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UsersResponse {
    pub message: String,
    pub users: Vec<PublicAccount>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeleteUserResponse {
    pub message: String,
    pub deleted_user: DeletedAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// HealthResponse
///
/// Liveness payload for GET /health. `uptime` is in seconds since the router was built.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
}
