use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::debug;

use shared_database::repository::{doctors, users};
use shared_database::AppState;
use shared_models::{AppError, RequestContext, Role};

use crate::jwt::validate_token;

/// Resolve the bearer token into a [`RequestContext`] and attach it to the
/// request. The account is re-read on every call so that deleted users and
/// blacklisted doctors lose access immediately.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Auth("Missing or invalid authorization header".to_string()))?;

    let claims = validate_token(bearer.token(), &state.config.session_secret).map_err(AppError::Auth)?;

    let context = state
        .db
        .call(|conn| {
            let user = users::find_by_id(conn, claims.user_id)?
                .ok_or_else(|| AppError::Auth("Account no longer exists".to_string()))?;

            if user.role == Role::Doctor && doctors::is_blacklisted_user(conn, user.id)? {
                return Err(AppError::Forbidden("Doctor account is blacklisted".to_string()));
            }

            Ok::<_, AppError>(RequestContext {
                user_id: user.id,
                username: user.username,
                role: user.role,
            })
        })
        .await?;

    debug!("Authenticated {} as {}", context.username, context.role);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
