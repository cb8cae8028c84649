use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::AppError,
    models::{PublicAccount, Role},
};

/// Name of the HTTP-only cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Claims
///
/// The signed session payload. The server keeps no copy: a token is valid exactly as long
/// as its signature checks out and `exp` lies in the future.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub email: String,
    pub role: Role,
    /// Issued At, seconds since the epoch.
    pub iat: i64,
    /// Expiration Time, seconds since the epoch. Always validated.
    pub exp: i64,
}

/// TokenService
///
/// Signs and verifies session tokens (HS256) with the configured secret and lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_expires_in_secs)
    }

    /// Issues a token for `account`, valid for the configured lifetime.
    pub fn sign(&self, account: &PublicAccount) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let exp = now
            .checked_add(self.ttl_secs)
            .ok_or_else(|| AppError::internal("token lifetime overflows the expiry timestamp"))?;
        let claims = Claims {
            id: account.id,
            email: account.email.clone(),
            role: account.role,
            iat: now,
            exp,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "expired",
                    ErrorKind::InvalidSignature => "bad signature",
                    _ => "malformed",
                };
                tracing::debug!(reason, "Rejected session token");
                Err(AppError::Authentication("Invalid or expired token".to_string()))
            }
        }
    }
}

/// PasswordService
///
/// Argon2id hashing with a fresh random salt per call. Hashing is CPU-bound, so the async
/// entry points move the work onto the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordService;

impl PasswordService {
    pub fn hash_blocking(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
    }

    /// Returns `Ok(false)` on mismatch; only a corrupt stored hash is an error.
    pub fn verify_blocking(password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "password verification failed: {e}"
            ))),
        }
    }

    pub async fn hash(&self, password: String) -> Result<String, AppError> {
        tokio::task::spawn_blocking(move || Self::hash_blocking(&password))
            .await
            .map_err(|e| AppError::internal(format!("hashing task failed: {e}")))?
    }

    pub async fn verify(&self, password: String, hash: String) -> Result<bool, AppError> {
        tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("verification task failed: {e}")))?
    }

    /// Burns the same amount of work as a real verification, for lookups that found no
    /// account. Keeps signin latency from revealing whether an email is registered.
    pub async fn verify_dummy(&self, password: String) {
        static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

        let _ = tokio::task::spawn_blocking(move || {
            let dummy = DUMMY_HASH
                .get_or_init(|| Self::hash_blocking("timing-equalizer-password").ok());
            if let Some(hash) = dummy {
                let _ = Self::verify_blocking(&password, hash);
            }
        })
        .await;
    }
}

/// Builds the session cookie for a freshly issued token.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

/// The removal cookie sent on signout: empty value, `Max-Age=0`, expiry in the past.
/// Path must match the one set at signin.
pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build();
    cookie.make_removal();
    cookie
}

/// AuthUser Extractor Result
///
/// The actor of an authenticated request, taken verbatim from verified session claims.
/// Handlers hand it to the policy engine; nothing in it comes from unsigned input.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Looks for the token in the session cookie first and falls back to an
/// `Authorization: Bearer` header. No database round-trip: sessions are stateless.
///
/// Rejection: `AppError::Authentication` (401) on a missing, malformed, tampered or
/// expired token.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);

        let from_cookie = CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string());

        let token = from_cookie
            .or_else(|| {
                parts
                    .headers
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                AppError::Authentication("No authentication token provided".to_string())
            })?;

        let claims = tokens.verify(&token)?;
        tracing::debug!(user_id = claims.id, role = %claims.role, "User authenticated");

        Ok(claims.into())
    }
}
