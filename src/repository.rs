use crate::{
    error::AppError,
    models::{Account, AccountChanges, NewAccount},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// Repository Trait
///
/// The credential store contract. Handlers and the account service only ever see
/// `Arc<dyn Repository>`, so Postgres can be swapped for an in-memory store in tests.
///
/// Email uniqueness is the store's job: `insert` and `update` report a duplicate as
/// `AppError::Conflict` even when a concurrent writer slipped past the service's check.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, AppError>;
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError>;
    /// Applies only the `Some` fields and stamps `updated_at`. `None` if no such row.
    async fn update(&self, id: i32, changes: AccountChanges) -> Result<Option<Account>, AppError>;
    /// Removes the row and returns it as it was. `None` if no such row.
    async fn delete(&self, id: i32) -> Result<Option<Account>, AppError>;
    async fn list(&self) -> Result<Vec<Account>, AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// PostgresRepository
///
/// The `Repository` implementation backed by the `users` table.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1 LIMIT 1");
        sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_by_email", e))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, AppError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_by_id", e))
    }

    /// insert
    ///
    /// A duplicate email surfaces as a unique violation on `users_email_key`, which the
    /// `From<sqlx::Error>` conversion turns into a Conflict.
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(account.name)
            .bind(account.email)
            .bind(account.password_hash)
            .bind(account.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("insert", e))
    }

    /// update
    ///
    /// One conditional statement: the row match and the write cannot be separated by a
    /// concurrent delete. `COALESCE` keeps the current value for every `None` field.
    async fn update(&self, id: i32, changes: AccountChanges) -> Result<Option<Account>, AppError> {
        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.role)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("update", e))
    }

    async fn delete(&self, id: i32) -> Result<Option<Account>, AppError> {
        let query = format!("DELETE FROM users WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("delete", e))
    }

    /// list
    ///
    /// Unpaginated: returns the whole table ordered by id.
    async fn list(&self) -> Result<Vec<Account>, AppError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM users ORDER BY id");
        sqlx::query_as::<_, Account>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list", e))
    }
}

/// Converts a driver error, logging it unless it is an expected unique violation.
fn db_error(op: &'static str, err: sqlx::Error) -> AppError {
    let mapped = AppError::from(err);
    if let AppError::Internal(detail) = &mapped {
        tracing::error!(op, "{}", detail);
    }
    mapped
}
