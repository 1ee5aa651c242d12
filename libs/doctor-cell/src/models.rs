use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::repository::availability::NewSlot;
use shared_database::DatabaseError;
use shared_models::{
    AppError, AssignedPatient, AvailabilitySlot, Department, DoctorScheduleEntry, DoctorSummary,
};
use shared_utils::validation::ValidationError;

// ==============================================================================
// TIME BANDS
// ==============================================================================

/// The four fixed daily bands a doctor can open for bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeBand {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeBand {
    pub const ALL: [TimeBand; 4] = [
        TimeBand::Morning,
        TimeBand::Afternoon,
        TimeBand::Evening,
        TimeBand::Night,
    ];

    /// Form key used in `YYYY-MM-DD_K` selections.
    pub fn key(self) -> u8 {
        match self {
            TimeBand::Morning => 1,
            TimeBand::Afternoon => 2,
            TimeBand::Evening => 3,
            TimeBand::Night => 4,
        }
    }

    /// Stored label, also the `time` of appointments booked in this band.
    pub fn label(self) -> &'static str {
        match self {
            TimeBand::Morning => "08:00 - 12:00",
            TimeBand::Afternoon => "12:00 - 16:00",
            TimeBand::Evening => "16:00 - 20:00",
            TimeBand::Night => "20:00 - 00:00",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|band| band.key().to_string() == key)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|band| band.label() == label)
    }
}

impl fmt::Display for TimeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One checked box of the availability form: a date and a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotSelection {
    pub date: NaiveDate,
    pub band: TimeBand,
}

impl FromStr for SlotSelection {
    type Err = AvailabilityError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (date, key) = raw
            .split_once('_')
            .ok_or_else(|| AvailabilityError::InvalidSelection(raw.to_string()))?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AvailabilityError::InvalidSelection(raw.to_string()))?;
        let band = TimeBand::from_key(key).ok_or_else(|| AvailabilityError::UnknownTimeBand(key.to_string()))?;
        Ok(SlotSelection { date, band })
    }
}

impl From<SlotSelection> for NewSlot {
    fn from(selection: SlotSelection) -> Self {
        NewSlot {
            date: selection.date,
            time_slot: selection.band.label().to_string(),
        }
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PublishAvailabilityRequest {
    #[serde(default)]
    pub availability: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    pub username: String,
    pub email: String,
    pub contact: Option<String>,
    pub department_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDoctorRequest {
    pub username: String,
    pub contact: Option<String>,
    pub specialization: Option<String>,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TimeBandView {
    pub key: u8,
    pub label: &'static str,
}

impl From<TimeBand> for TimeBandView {
    fn from(band: TimeBand) -> Self {
        Self {
            key: band.key(),
            label: band.label(),
        }
    }
}

/// Data for the availability form: the publishable window and what is open now.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityOverview {
    pub doctor_id: i64,
    pub dates: Vec<NaiveDate>,
    pub time_bands: Vec<TimeBandView>,
    pub open_slots: Vec<AvailabilitySlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentDoctors {
    pub department: Department,
    pub doctors: Vec<DoctorSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDashboard {
    pub doctor: DoctorSummary,
    pub today: NaiveDate,
    pub today_schedule: Vec<DoctorScheduleEntry>,
    pub assigned_patients: Vec<AssignedPatient>,
    pub upcoming: Vec<DoctorScheduleEntry>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Invalid availability selection: {0}")]
    InvalidSelection(String),

    #[error("Unknown time slot key: {0}")]
    UnknownTimeBand(String),

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::InvalidSelection(_) | AvailabilityError::UnknownTimeBand(_) => {
                AppError::ValidationError(err.to_string())
            }
            AvailabilityError::DoctorNotFound => AppError::NotFound(err.to_string()),
            AvailabilityError::Database(e) => e.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Department not found")]
    DepartmentNotFound,

    #[error("Unknown department: {0}")]
    UnknownDepartment(i64),

    #[error("Username or email already in use")]
    DuplicateAccount,

    #[error("No doctor profile for this account")]
    NoProfile,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound | DoctorError::DepartmentNotFound => AppError::NotFound(err.to_string()),
            DoctorError::UnknownDepartment(_) => AppError::ValidationError(err.to_string()),
            DoctorError::DuplicateAccount => AppError::Conflict(err.to_string()),
            DoctorError::NoProfile => AppError::Forbidden(err.to_string()),
            DoctorError::Validation(e) => e.into(),
            DoctorError::Database(e) => e.into(),
        }
    }
}
