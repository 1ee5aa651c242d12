use serde::Deserialize;
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::AppError;
use shared_utils::validation::ValidationError;

/// Self-service registration always creates a patient account.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Access denied: account is blacklisted")]
    Blacklisted,

    #[error("Username or email already registered")]
    DuplicateAccount,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Session token error: {0}")]
    Token(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::Blacklisted => AppError::Forbidden(err.to_string()),
            AuthError::DuplicateAccount => AppError::Conflict(err.to_string()),
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::Validation(e) => e.into(),
            AuthError::Token(msg) => AppError::Internal(msg),
            AuthError::Database(e) => e.into(),
        }
    }
}
