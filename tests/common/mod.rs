#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI32, Ordering},
};

use acquisitions_api::{
    AppConfig, AppState,
    auth::PasswordService,
    create_router,
    error::AppError,
    models::{Account, AccountChanges, NewAccount, PublicAccount, Role},
    repository::Repository,
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

// --- In-Memory Repository ---

/// A `Repository` over a plain vector. Enforces email uniqueness the way the unique
/// index does in Postgres, so conflict paths behave identically.
#[derive(Default)]
pub struct InMemoryRepository {
    accounts: Mutex<Vec<Account>>,
    next_id: AtomicI32,
}

impl InMemoryRepository {
    /// Inserts an account directly, bypassing the service. With `password: None` the
    /// stored hash is unusable, which is fine for tests that never sign in.
    pub fn seed(&self, name: &str, email: &str, role: Role, password: Option<&str>) -> Account {
        let password_hash = match password {
            Some(password) => PasswordService::hash_blocking(password).unwrap(),
            None => "unusable-hash".to_string(),
        };
        let now = Utc::now();
        let account = Account {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        };
        self.accounts.lock().unwrap().push(account.clone());
        account
    }

    pub fn stored(&self, id: i32) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, AppError> {
        Ok(self.stored(id))
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(AppError::email_conflict());
        }
        let now = Utc::now();
        let created = Account {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
            created_at: now,
            updated_at: now,
        };
        accounts.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, changes: AccountChanges) -> Result<Option<Account>, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(email) = &changes.email {
            if accounts.iter().any(|a| a.id != id && &a.email == email) {
                return Err(AppError::email_conflict());
            }
        }
        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            account.name = name;
        }
        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(hash) = changes.password_hash {
            account.password_hash = hash;
        }
        if let Some(role) = changes.role {
            account.role = role;
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn delete(&self, id: i32) -> Result<Option<Account>, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let position = accounts.iter().position(|a| a.id == id);
        Ok(position.map(|index| accounts.remove(index)))
    }

    async fn list(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.accounts.lock().unwrap().clone())
    }
}

// --- Test Application ---

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<InMemoryRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::default());
        let state = AppState::new(repo.clone(), AppConfig::default());
        let router = create_router(state.clone());
        Self { router, state, repo }
    }

    /// A valid session token for an already-seeded account.
    pub fn token_for(&self, account: &Account) -> String {
        self.state
            .tokens
            .sign(&PublicAccount::from(account.clone()))
            .unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// The session token from the `Set-Cookie` header, if one was issued.
    pub fn session_token(&self) -> Option<String> {
        let cookie = self.set_cookie()?;
        let pair = cookie.split(';').next()?;
        let value = pair.strip_prefix("token=")?;
        (!value.is_empty()).then(|| value.to_string())
    }
}
