use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        // Patient self-service
        .route("/me/dashboard", get(handlers::my_dashboard))
        .route("/me/profile", put(handlers::update_my_profile))
        .route("/me/history", get(handlers::my_history))
        // Doctor-side history recording
        .route("/{patient_id}/history-context", get(handlers::history_context))
        .route("/{patient_id}/history", post(handlers::add_history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
