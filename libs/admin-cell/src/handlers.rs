use std::sync::Arc;

use axum::extract::{Extension, Json, Query, State};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::{AppError, RequestContext, Role};

use crate::models::SearchQuery;
use crate::services::AdminService;

#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<Value>, AppError> {
    context.require_role(Role::Admin)?;

    let dashboard = AdminService::new(&state).dashboard().await?;

    Ok(Json(json!({
        "success": true,
        "dashboard": dashboard
    })))
}

#[axum::debug_handler]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    context.require_role(Role::Admin)?;

    // No query yet means an empty result page, not a full listing.
    let results = match query.q.as_deref() {
        Some(q) => AdminService::new(&state).search(q).await?,
        None => Vec::new(),
    };

    Ok(Json(json!({
        "success": true,
        "query": query.q.unwrap_or_default(),
        "results": results
    })))
}
