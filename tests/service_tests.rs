use acquisitions_api::{
    AccountService,
    auth::AuthUser,
    error::AppError,
    models::{Role, UpdateUserRequest},
    repository::RepositoryState,
};
use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

mod common;
use common::InMemoryRepository;

// --- Log Capture ---

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

/// Installs a plain-text subscriber for the current thread and returns its output buffer.
fn capture_logs() -> (SharedBuf, tracing::subscriber::DefaultGuard) {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buf, guard)
}

fn setup() -> (AccountService, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::default());
    let service = AccountService::new(repo.clone() as RepositoryState);
    (service, repo)
}

fn actor(id: i32, role: Role) -> AuthUser {
    AuthUser {
        id,
        email: format!("actor{id}@example.com"),
        role,
    }
}

// --- Missing Targets ---

#[tokio::test]
async fn test_missing_target_is_logged_with_actor_context() {
    let (service, _repo) = setup();
    let admin = actor(1, Role::Admin);
    let (logs, _guard) = capture_logs();

    let read = service.get_as(404, &admin).await;
    let update = service
        .update(
            405,
            &admin,
            UpdateUserRequest {
                name: Some("Ghost".to_string()),
                ..Default::default()
            },
        )
        .await;
    let delete = service.remove(406, &admin).await;

    for result in [read.map(|_| ()), update.map(|_| ()), delete.map(|_| ())] {
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    let output = logs.contents();
    for (target, op) in [(404, "read"), (405, "update"), (406, "delete")] {
        let line = output
            .lines()
            .find(|line| line.contains(&format!("target_id={target}")))
            .unwrap_or_else(|| panic!("no log line for target {target}:\n{output}"));
        assert!(line.contains("Target user not found"));
        assert!(line.contains("actor_id=1"));
        assert!(line.contains("actor_email=actor1@example.com"));
        assert!(line.contains(&format!("op=\"{op}\"")));
    }
}

#[tokio::test]
async fn test_denial_is_logged_before_any_lookup() {
    let (service, repo) = setup();
    let target = repo.seed("Ann", "ann@example.com", Role::User, None);
    let stranger = actor(99, Role::User);
    let (logs, _guard) = capture_logs();

    let result = service.get_as(target.id, &stranger).await;
    assert!(matches!(result, Err(AppError::Authorization(_))));

    let output = logs.contents();
    assert!(output.contains("Request denied"));
    assert!(output.contains("actor_id=99"));
    assert!(!output.contains("Target user not found"));
}

// --- Registration ---

#[tokio::test]
async fn test_register_defaults_role_and_hashes_password() {
    let (service, repo) = setup();
    let request = acquisitions_api::models::SignupRequest {
        name: "A".to_string(),
        email: "a@x.com".to_string(),
        password: "secret1".to_string(),
        role: None,
    };

    let created = service.register(request).await.unwrap();
    assert_eq!(created.role, Role::User);

    let stored = repo.stored(created.id).unwrap();
    assert_ne!(stored.password_hash, "secret1");
    assert!(service.authenticate("a@x.com", "secret1".to_string()).await.is_ok());
}
