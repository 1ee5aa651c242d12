//! Fixtures shared by the cell integration tests: an in-memory seeded
//! state, accounts with ready-made session tokens, and request helpers.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_database::repository::{doctors, patients, users};
use shared_database::{seed, AppState, Database};
use shared_models::{RequestContext, Role};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub default_doctor_password: String,
    pub availability_window_days: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            session_secret: "test-secret-key-for-session-tokens-long-enough".to_string(),
            session_ttl_hours: 1,
            default_doctor_password: "temp123".to_string(),
            availability_window_days: 7,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_path: ":memory:".to_string(),
            session_secret: self.session_secret.clone(),
            session_ttl_hours: self.session_ttl_hours,
            bind_address: "127.0.0.1:0".to_string(),
            admin_username: "Superuser".to_string(),
            admin_email: "admin@gmail.com".to_string(),
            admin_password: "1234567890".to_string(),
            admin_contact: "0000000000".to_string(),
            default_doctor_password: self.default_doctor_password.clone(),
            availability_window_days: self.availability_window_days,
        }
    }

    /// Fresh in-memory store, migrated and seeded with the admin account
    /// and default departments.
    pub async fn state(&self) -> Arc<AppState> {
        let config = self.to_app_config();
        let db = Database::open_in_memory().expect("in-memory database opens");
        seed::bootstrap(&db, &config).await.expect("seed succeeds");
        Arc::new(AppState::new(config, db))
    }
}

/// An account inserted directly into the store, with a valid token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: i64,
    /// Doctor or patient profile id; `None` for the admin.
    pub profile_id: Option<i64>,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub token: String,
}

impl TestUser {
    pub async fn patient(state: &AppState, username: &str) -> Self {
        let email = format!("{}@example.com", username);
        let (user_id, profile_id) = state
            .db
            .transaction(|conn| {
                let user_id = users::insert_user(
                    conn,
                    &users::NewUser {
                        username,
                        email: &email,
                        password: "password",
                        role: Role::Patient,
                        contact: Some("5550100"),
                        age: Some(30),
                        gender: Some("female"),
                    },
                )?;
                let patient_id = patients::insert_patient(conn, user_id)?;
                Ok::<_, shared_database::DatabaseError>((user_id, patient_id))
            })
            .await
            .expect("patient inserted");
        Self::finish(state, user_id, Some(profile_id), username, "password", Role::Patient)
    }

    pub async fn doctor(state: &AppState, username: &str, department_id: Option<i64>) -> Self {
        let email = format!("{}@example.com", username);
        let (user_id, profile_id) = state
            .db
            .transaction(|conn| {
                let user_id = users::insert_user(
                    conn,
                    &users::NewUser {
                        username,
                        email: &email,
                        password: "temp123",
                        role: Role::Doctor,
                        contact: Some("5550199"),
                        age: None,
                        gender: None,
                    },
                )?;
                let doctor_id = doctors::insert_doctor(
                    conn,
                    &doctors::NewDoctor {
                        user_id,
                        department_id,
                        specialization: Some("General Medicine"),
                    },
                )?;
                Ok::<_, shared_database::DatabaseError>((user_id, doctor_id))
            })
            .await
            .expect("doctor inserted");
        Self::finish(state, user_id, Some(profile_id), username, "temp123", Role::Doctor)
    }

    /// The admin account created by the bootstrap seed.
    pub async fn admin(state: &AppState) -> Self {
        let admin = state
            .db
            .call(|conn| users::find_first_by_role(conn, Role::Admin))
            .await
            .expect("admin lookup")
            .expect("seeded admin exists");
        let password = admin.password.clone();
        Self::finish(state, admin.id, None, &admin.username, &password, Role::Admin)
    }

    fn finish(
        state: &AppState,
        user_id: i64,
        profile_id: Option<i64>,
        username: &str,
        password: &str,
        role: Role,
    ) -> Self {
        let context = RequestContext {
            user_id,
            username: username.to_string(),
            role,
        };
        let issued = issue_token(&context, &state.config.session_secret, state.config.session_ttl_hours)
            .expect("token issued");
        Self {
            user_id,
            profile_id,
            username: username.to_string(),
            password: password.to_string(),
            role,
            token: issued.token,
        }
    }

    pub fn context(&self) -> RequestContext {
        RequestContext {
            user_id: self.user_id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn id(&self) -> i64 {
        self.profile_id.expect("account has a role profile")
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        issue_token(&user.context(), secret, -1).expect("token issued").token
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        issue_token(&user.context(), "wrong-secret", 1).expect("token issued").token
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Build a request with an optional bearer token and JSON body.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("body is JSON")
}
