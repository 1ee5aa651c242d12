use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
};
use chrono::Local;
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::{AppError, RequestContext, Role};

use crate::models::{CreateDoctorRequest, PublishAvailabilityRequest, UpdateDoctorRequest};
use crate::services::{AvailabilityService, DoctorService};

// ==============================================================================
// DISCOVERY
// ==============================================================================

#[axum::debug_handler]
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let departments = DoctorService::new(&state).list_departments().await?;

    Ok(Json(json!({
        "success": true,
        "departments": departments
    })))
}

#[axum::debug_handler]
pub async fn department_doctors(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(department_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    context.require_role(Role::Patient)?;

    let listing = DoctorService::new(&state).department_doctors(department_id).await?;

    Ok(Json(json!({
        "success": true,
        "department": listing.department,
        "doctors": listing.doctors
    })))
}

#[axum::debug_handler]
pub async fn open_slots(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    context.require_role(Role::Patient)?;

    let slots = AvailabilityService::new(&state).list_open_slots(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "doctor_id": doctor_id,
        "slots": slots
    })))
}

// ==============================================================================
// DOCTOR SELF-SERVICE
// ==============================================================================

#[axum::debug_handler]
pub async fn my_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.profile_for(&context).await?;
    let dashboard = service.dashboard(doctor.id, Local::now().date_naive()).await?;

    Ok(Json(json!({
        "success": true,
        "dashboard": dashboard
    })))
}

#[axum::debug_handler]
pub async fn my_availability(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).profile_for(&context).await?;
    let overview = AvailabilityService::new(&state)
        .overview(doctor.id, Local::now().date_naive())
        .await?;

    Ok(Json(json!({
        "success": true,
        "availability": overview
    })))
}

#[axum::debug_handler]
pub async fn publish_availability(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<PublishAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).profile_for(&context).await?;
    let slots = AvailabilityService::new(&state)
        .publish_availability(doctor.id, &request.availability)
        .await?;

    Ok(Json(json!({
        "success": true,
        "slots": slots,
        "message": "Availability updated"
    })))
}

// ==============================================================================
// ADMIN MANAGEMENT
// ==============================================================================

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    context.require_role(Role::Admin)?;

    let doctor = DoctorService::new(&state).create_doctor(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "doctor": doctor
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    context.require_role(Role::Admin)?;

    let doctor = DoctorService::new(&state).update_doctor(doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    context.require_role(Role::Admin)?;

    DoctorService::new(&state).delete_doctor(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted"
    })))
}

#[axum::debug_handler]
pub async fn toggle_blacklist(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    context.require_role(Role::Admin)?;

    let blacklisted = DoctorService::new(&state).toggle_blacklist(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "doctor_id": doctor_id,
        "blacklisted": blacklisted
    })))
}
