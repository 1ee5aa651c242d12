use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        // Discovery
        .route("/departments", get(handlers::list_departments))
        .route("/departments/{department_id}", get(handlers::department_doctors))
        .route("/{doctor_id}/slots", get(handlers::open_slots))
        // Doctor self-service
        .route("/me/dashboard", get(handlers::my_dashboard))
        .route(
            "/me/availability",
            get(handlers::my_availability).put(handlers::publish_availability),
        )
        // Admin management
        .route("/", post(handlers::create_doctor))
        .route(
            "/{doctor_id}",
            put(handlers::update_doctor).delete(handlers::delete_doctor),
        )
        .route("/{doctor_id}/blacklist", post(handlers::toggle_blacklist))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
