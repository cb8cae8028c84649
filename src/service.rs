//! Account operations.
//!
//! [`AccountService`] owns the sequencing of every account use case: policy check, lookups,
//! hashing, the write. Permission decisions are delegated to [`crate::policy`]; the service
//! only translates a denial into an error and logs it with the actor's identity.

use crate::{
    auth::{AuthUser, PasswordService},
    error::AppError,
    models::{
        AccountChanges, DeletedAccount, NewAccount, PublicAccount, SignupRequest,
        UpdateUserRequest,
    },
    policy::{self, AccountField, Action},
    repository::RepositoryState,
};

#[derive(Clone)]
pub struct AccountService {
    repo: RepositoryState,
    passwords: PasswordService,
}

impl AccountService {
    pub fn new(repo: RepositoryState) -> Self {
        Self {
            repo,
            passwords: PasswordService,
        }
    }

    /// register
    ///
    /// Creates an account. Expects a normalized request (lowercased email).
    pub async fn register(&self, req: SignupRequest) -> Result<PublicAccount, AppError> {
        if self.repo.find_by_email(&req.email).await?.is_some() {
            tracing::warn!(email = %req.email, "Signup rejected: email already registered");
            return Err(AppError::email_conflict());
        }

        let password_hash = self.passwords.hash(req.password).await?;
        let account = self
            .repo
            .insert(NewAccount {
                name: req.name,
                email: req.email,
                password_hash,
                role: req.role.unwrap_or_default(),
            })
            .await?;

        tracing::info!(user_id = account.id, email = %account.email, "User created");
        Ok(account.into())
    }

    /// authenticate
    ///
    /// Unknown email and wrong password produce the same error, and take about the same
    /// time: a dummy verification runs when no account matches.
    pub async fn authenticate(
        &self,
        email: &str,
        password: String,
    ) -> Result<PublicAccount, AppError> {
        let Some(account) = self.repo.find_by_email(email).await? else {
            self.passwords.verify_dummy(password).await;
            tracing::warn!(email, "Signin failed");
            return Err(AppError::invalid_credentials());
        };

        if !self
            .passwords
            .verify(password, account.password_hash.clone())
            .await?
        {
            tracing::warn!(email, "Signin failed");
            return Err(AppError::invalid_credentials());
        }

        tracing::info!(user_id = account.id, email = %account.email, "User signed in");
        Ok(account.into())
    }

    pub async fn get(&self, id: i32) -> Result<PublicAccount, AppError> {
        let account = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(AppError::user_not_found)?;
        tracing::debug!(user_id = id, "Retrieved user");
        Ok(account.into())
    }

    /// Read access for `actor`: owner or admin.
    pub async fn get_as(&self, id: i32, actor: &AuthUser) -> Result<PublicAccount, AppError> {
        check(actor, id, Action::Read)?;
        self.get(id).await.map_err(|err| match err {
            AppError::NotFound { .. } => missing(actor, id, "read"),
            other => other,
        })
    }

    /// list
    ///
    /// Admin only. The whole table is returned; there is no pagination.
    pub async fn list(&self, actor: &AuthUser) -> Result<Vec<PublicAccount>, AppError> {
        check(actor, actor.id, Action::List)?;
        let accounts = self.repo.list().await?;
        Ok(accounts.into_iter().map(PublicAccount::from).collect())
    }

    /// update
    ///
    /// Policy first, then existence, then email uniqueness, then the write. The write is
    /// a conditional single statement, so a row deleted after the existence check still
    /// yields NotFound rather than a phantom success.
    pub async fn update(
        &self,
        id: i32,
        actor: &AuthUser,
        req: UpdateUserRequest,
    ) -> Result<PublicAccount, AppError> {
        let fields = req.fields();
        if fields.is_empty() {
            return Err(AppError::Validation(
                "At least one field must be provided for update".to_string(),
            ));
        }
        check(actor, id, Action::Update(&fields))?;

        if self.repo.find_by_id(id).await?.is_none() {
            return Err(missing(actor, id, "update"));
        }

        if let Some(email) = &req.email {
            if let Some(existing) = self.repo.find_by_email(email).await? {
                if existing.id != id {
                    tracing::warn!(actor_id = actor.id, target_id = id, "Update rejected: email in use");
                    return Err(AppError::email_conflict());
                }
            }
        }

        let allowed = policy::mutable_fields(actor, id);
        let password_hash = match req.password {
            Some(password) if allowed.contains(&AccountField::Password) => {
                Some(self.passwords.hash(password).await?)
            }
            _ => None,
        };
        let changes = AccountChanges {
            name: req.name.filter(|_| allowed.contains(&AccountField::Name)),
            email: req.email.filter(|_| allowed.contains(&AccountField::Email)),
            password_hash,
            role: req.role.filter(|_| allowed.contains(&AccountField::Role)),
        };

        let updated = self
            .repo
            .update(id, changes)
            .await?
            .ok_or_else(|| missing(actor, id, "update"))?;

        tracing::info!(
            user_id = updated.id,
            actor_id = actor.id,
            actor_email = %actor.email,
            "User updated"
        );
        Ok(updated.into())
    }

    /// remove
    ///
    /// Admin only, never on oneself. Returns the record as it was before deletion.
    pub async fn remove(&self, id: i32, actor: &AuthUser) -> Result<DeletedAccount, AppError> {
        check(actor, id, Action::Delete)?;

        let deleted = self
            .repo
            .delete(id)
            .await?
            .ok_or_else(|| missing(actor, id, "delete"))?;

        tracing::info!(
            user_id = deleted.id,
            email = %deleted.email,
            actor_email = %actor.email,
            "User deleted"
        );
        Ok(deleted.into())
    }
}

/// A missing target, logged with the actor who asked for it.
fn missing(actor: &AuthUser, target_id: i32, op: &'static str) -> AppError {
    tracing::warn!(
        actor_id = actor.id,
        actor_email = %actor.email,
        target_id,
        op,
        "Target user not found"
    );
    AppError::user_not_found()
}

/// Runs the policy engine and logs any denial with the actor's context.
fn check(actor: &AuthUser, target_id: i32, action: Action<'_>) -> Result<(), AppError> {
    policy::authorize(actor, target_id, action).map_err(|denial| {
        tracing::warn!(
            actor_id = actor.id,
            actor_email = %actor.email,
            actor_role = %actor.role,
            target_id,
            action = ?action,
            reason = %denial,
            "Request denied"
        );
        AppError::Authorization(denial)
    })
}
