use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::{AppError, AppointmentOverview, DoctorSummary, PatientSummary};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Blacklisted doctors are left out of every count and list here.
#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub total_doctors: i64,
    pub total_patients: i64,
    pub total_appointments: i64,
    pub doctors: Vec<DoctorSummary>,
    pub patients: Vec<PatientSummary>,
    pub appointments: Vec<AppointmentOverview>,
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Database(e) => e.into(),
        }
    }
}
