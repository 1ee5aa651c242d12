use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::repository::{doctors, patients, users};
use shared_database::{AppState, Database, DatabaseError};
use shared_models::auth::TokenResponse;
use shared_models::{RequestContext, Role, User};
use shared_utils::jwt::issue_token;
use shared_utils::validation::{required, validate_age, validate_contact, validate_email};

use crate::models::{AuthError, LoginRequest, RegisterRequest};

pub struct AuthService {
    db: Database,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            config: state.config.clone(),
        }
    }

    /// Create a patient account and its profile in one transaction.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        debug!("Registering patient account: {}", request.username);

        let username = required("username", &request.username)?;
        let email = required("email", &request.email)?;
        let password = required("password", &request.password)?;
        validate_email(email)?;
        validate_contact(request.contact.as_deref())?;
        validate_age(request.age)?;

        let user = self
            .db
            .transaction(|conn| {
                if users::find_conflicting(conn, username, email, None)?.is_some() {
                    return Err(AuthError::DuplicateAccount);
                }

                let user_id = users::insert_user(
                    conn,
                    &users::NewUser {
                        username,
                        email,
                        password,
                        role: Role::Patient,
                        contact: request.contact.as_deref(),
                        age: request.age,
                        gender: request.gender.as_deref(),
                    },
                )
                .map_err(|e| {
                    if e.is_constraint_violation() {
                        AuthError::DuplicateAccount
                    } else {
                        AuthError::Database(e)
                    }
                })?;
                patients::insert_patient(conn, user_id)?;

                users::find_by_id(conn, user_id)?
                    .ok_or_else(|| DatabaseError::not_found("user", user_id).into())
            })
            .await?;

        info!("Registered patient {} (user {})", user.username, user.id);
        Ok(user)
    }

    /// Check credentials and issue a session token. Blacklisted doctors are
    /// refused even with correct credentials.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AuthError> {
        debug!("Login attempt for: {}", request.username);

        let user = self
            .db
            .call(|conn| {
                let user = users::find_by_credentials(conn, &request.username, &request.password)?
                    .ok_or(AuthError::InvalidCredentials)?;
                if user.role == Role::Doctor && doctors::is_blacklisted_user(conn, user.id)? {
                    return Err(AuthError::Blacklisted);
                }
                Ok(user)
            })
            .await
            .inspect_err(|e| warn!("Login refused for {}: {}", request.username, e))?;

        let context = RequestContext {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        };
        let issued = issue_token(&context, &self.config.session_secret, self.config.session_ttl_hours)
            .map_err(AuthError::Token)?;

        info!("User {} logged in as {}", user.username, user.role);
        Ok(TokenResponse {
            token: issued.token,
            user_id: user.id,
            username: user.username,
            role: user.role,
            expires_at: issued.expires_at,
        })
    }

    pub async fn current_user(&self, context: &RequestContext) -> Result<User, AuthError> {
        self.db
            .call(|conn| users::find_by_id(conn, context.user_id))
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
