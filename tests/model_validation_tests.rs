use acquisitions_api::{
    error::AppError,
    models::{
        Account, DeleteUserResponse, DeletedAccount, Normalize, PublicAccount, Role,
        SigninRequest, SignupRequest, UpdateUserRequest,
    },
    policy::AccountField,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

fn account() -> Account {
    let now = Utc::now();
    Account {
        id: 5,
        name: "Ann".to_string(),
        email: "ann@example.com".to_string(),
        password_hash: "$argon2id$v=19$secret".to_string(),
        role: Role::Admin,
        created_at: now,
        updated_at: now,
    }
}

// --- Role ---

#[test]
fn test_role_wire_format_is_lowercase() {
    assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));
    assert_eq!(serde_json::to_value(Role::User).unwrap(), json!("user"));
    assert_eq!(
        serde_json::from_value::<Role>(json!("user")).unwrap(),
        Role::User
    );
    assert!(serde_json::from_value::<Role>(json!("Admin")).is_err());
    assert!(serde_json::from_value::<Role>(json!("root")).is_err());
    assert_eq!(Role::default(), Role::User);
}

// --- Projections ---

#[test]
fn test_account_debug_redacts_password_hash() {
    let rendered = format!("{:?}", account());

    assert!(rendered.contains("ann@example.com"));
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("argon2"));
}

#[test]
fn test_public_projection_drops_password_hash() {
    let public = PublicAccount::from(account());
    let value = serde_json::to_value(&public).unwrap();

    assert_eq!(value["id"], 5);
    assert_eq!(value["role"], "admin");
    assert!(value.get("password_hash").is_none());
    assert!(!value.to_string().contains("argon2"));
}

#[test]
fn test_delete_response_shape() {
    let response = DeleteUserResponse {
        message: "User deleted successfully".to_string(),
        deleted_user: DeletedAccount::from(account()),
    };
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(
        value["deletedUser"],
        json!({ "id": 5, "name": "Ann", "email": "ann@example.com", "role": "admin" })
    );
    assert!(value.get("deleted_user").is_none());
}

// --- Signup ---

#[test]
fn test_signup_normalization_then_validation() {
    let request: SignupRequest = serde_json::from_value(json!({
        "name": "  Ann  ",
        "email": "  Ann@Example.COM ",
        "password": "secret1"
    }))
    .unwrap();

    let request = request.normalize();
    assert_eq!(request.name, "Ann");
    assert_eq!(request.email, "ann@example.com");
    assert_eq!(request.role, None);
    assert!(request.validate().is_ok());
}

#[test]
fn test_signup_field_limits() {
    let valid = SignupRequest {
        name: "Ann".to_string(),
        email: "ann@example.com".to_string(),
        password: "secret".to_string(),
        role: Some(Role::User),
    };
    assert!(valid.validate().is_ok());

    let cases = [
        SignupRequest { name: String::new(), ..valid.clone() },
        SignupRequest { name: "x".repeat(256), ..valid.clone() },
        SignupRequest { email: "ann.example.com".to_string(), ..valid.clone() },
        SignupRequest { password: "12345".to_string(), ..valid.clone() },
        SignupRequest { password: "p".repeat(129), ..valid.clone() },
    ];
    for case in cases {
        assert!(case.validate().is_err(), "{case:?} should fail validation");
    }

    let single_letter = SignupRequest {
        name: "A".to_string(),
        ..valid.clone()
    };
    assert!(single_letter.validate().is_ok());

    let boundary = SignupRequest {
        name: "x".repeat(255),
        password: "p".repeat(128),
        ..valid
    };
    assert!(boundary.validate().is_ok());
}

#[test]
fn test_signup_rejects_unknown_fields() {
    let result = serde_json::from_value::<SignupRequest>(json!({
        "name": "Ann",
        "email": "ann@example.com",
        "password": "secret1",
        "password_hash": "x"
    }));
    assert!(result.is_err());
}

#[test]
fn test_validation_errors_become_one_sorted_message() {
    let request = SignupRequest {
        name: String::new(),
        email: "bad".to_string(),
        password: "1".to_string(),
        role: None,
    };
    let err = AppError::from(request.validate().unwrap_err());

    match err {
        AppError::Validation(message) => assert_eq!(
            message,
            "Invalid email format,Name must be between 1 and 255 characters,\
             Password must be between 6 and 128 characters"
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
}

// --- Signin ---

#[test]
fn test_signin_requires_password_and_valid_email() {
    let request = SigninRequest {
        email: " Ann@Example.com".to_string(),
        password: String::new(),
    }
    .normalize();

    assert_eq!(request.email, "ann@example.com");
    assert!(request.validate().is_err());
}

// --- Update ---

#[test]
fn test_update_request_reports_requested_fields() {
    let request: UpdateUserRequest =
        serde_json::from_value(json!({ "email": "x@y.com", "role": "admin" })).unwrap();
    assert_eq!(request.fields(), vec![AccountField::Email, AccountField::Role]);

    let empty: UpdateUserRequest = serde_json::from_value(json!({})).unwrap();
    assert!(empty.fields().is_empty());
    assert!(empty.validate().is_ok());
}

#[test]
fn test_update_request_validates_only_supplied_fields() {
    let request = UpdateUserRequest {
        name: Some(" Bo ".to_string()),
        ..Default::default()
    }
    .normalize();
    assert_eq!(request.name.as_deref(), Some("Bo"));
    assert!(request.validate().is_ok());

    let request = UpdateUserRequest {
        password: Some("123".to_string()),
        ..Default::default()
    };
    assert!(request.validate().is_err());

    assert!(serde_json::from_value::<UpdateUserRequest>(json!({ "id": 3 })).is_err());
}
