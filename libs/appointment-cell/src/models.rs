use serde::Deserialize;
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::{AppError, AppointmentStatus};
use shared_utils::validation::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: i64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Band label (`08:00 - 12:00`) or its form key (`1`..`4`).
    pub time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteAppointmentRequest {
    pub diagnosis: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor has not opened this slot")]
    SlotNotAvailable,

    #[error("Unknown time slot: {0}")]
    UnknownTimeSlot(String),

    #[error("This slot is already booked. Please choose another.")]
    ConflictDetected,

    #[error("Unauthorized access to appointment")]
    UnauthorizedAccess,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::PatientNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SlotNotAvailable | AppointmentError::UnknownTimeSlot(_) => {
                AppError::ValidationError(err.to_string())
            }
            AppointmentError::ConflictDetected | AppointmentError::InvalidStatusTransition(_) => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::UnauthorizedAccess => AppError::Forbidden(err.to_string()),
            AppointmentError::Validation(e) => e.into(),
            AppointmentError::Database(e) => e.into(),
        }
    }
}
