use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::{AppError, Department, HistoryRecord, Patient, PatientAppointmentView, User};
use shared_utils::validation::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub email: String,
    /// Left unchanged when absent or blank.
    pub password: Option<String>,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddHistoryRequest {
    pub visit_type: String,
    pub diagnosis: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientDashboard {
    pub user: User,
    pub patient: Patient,
    pub departments: Vec<Department>,
    pub appointments: Vec<PatientAppointmentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientHistoryView {
    pub history: Vec<HistoryRecord>,
    pub past_appointments: Vec<PatientAppointmentView>,
}

/// Header data for the doctor's history form.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryContext {
    pub patient_id: i64,
    pub patient_name: String,
    pub doctor_name: String,
    pub department: String,
}

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Patient profile not found")]
    NoProfile,

    #[error("Only doctors can record patient history")]
    NotADoctor,

    #[error("Username or email already in use")]
    DuplicateAccount,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::NoProfile | PatientError::NotADoctor => AppError::Forbidden(err.to_string()),
            PatientError::DuplicateAccount => AppError::Conflict(err.to_string()),
            PatientError::Validation(e) => e.into(),
            PatientError::Database(e) => e.into(),
        }
    }
}
