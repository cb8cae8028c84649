use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{error::AppError, models::Normalize};

/// ValidatedJson
///
/// A JSON body that has been parsed, normalized and validated. Every failure along the
/// way (syntax, unknown fields, a bad role value, a broken rule) is a 400 with the
/// standard error payload instead of axum's default plain-text 422.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Normalize,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        let value = value.normalize();
        value.validate()?;
        Ok(Self(value))
    }
}

/// UserId
///
/// The `{id}` path segment of the user routes: a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i32);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        parse_user_id(&raw).map(Self)
    }
}

/// Parses a user id path segment. Only plain digits are accepted, and zero is not an id.
pub fn parse_user_id(raw: &str) -> Result<i32, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::Validation(
            "ID must be a positive integer".to_string(),
        ));
    }
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(AppError::Validation("ID must be greater than 0".to_string())),
        Err(_) => Err(AppError::Validation("ID is out of range".to_string())),
    }
}
