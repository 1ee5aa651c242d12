use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::{AppError, RequestContext};

use crate::models::{AddHistoryRequest, UpdateProfileRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn my_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<Value>, AppError> {
    let dashboard = PatientService::new(&state).dashboard(&context).await?;

    Ok(Json(json!({
        "success": true,
        "dashboard": dashboard
    })))
}

#[axum::debug_handler]
pub async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let user = PatientService::new(&state).update_profile(&context, request).await?;

    Ok(Json(json!({
        "success": true,
        "user": user,
        "message": "Profile updated."
    })))
}

#[axum::debug_handler]
pub async fn my_history(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<Value>, AppError> {
    let view = PatientService::new(&state).history(&context).await?;

    Ok(Json(json!({
        "success": true,
        "history": view.history,
        "past_appointments": view.past_appointments
    })))
}

#[axum::debug_handler]
pub async fn history_context(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let details = PatientService::new(&state)
        .history_context(&context, patient_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "patient_details": details
    })))
}

#[axum::debug_handler]
pub async fn add_history(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(patient_id): Path<i64>,
    Json(request): Json<AddHistoryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let record = PatientService::new(&state)
        .add_history(&context, patient_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "record": record
        })),
    ))
}
