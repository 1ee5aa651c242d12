use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

// ==============================================================================
// STORED RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub department_id: Option<i64>,
    pub specialization: Option<String>,
    pub blacklisted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub user_id: i64,
    pub patient_history: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time_slot: String,
    pub is_available: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Pending,
    Booked,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Booked => "Booked",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    /// Active appointments hold their (doctor, date, time) slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Booked)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(AppointmentStatus::Pending),
            "Booked" => Ok(AppointmentStatus::Booked),
            "Completed" => Ok(AppointmentStatus::Completed),
            "Cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status: {}", other)),
        }
    }
}

/// Doctor and patient references are nullable: deleting either side
/// leaves the appointment in place with the reference cleared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: i64,
    pub patient_id: i64,
    pub visit_type: Option<String>,
    pub diagnosis: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// MATERIALIZED READ MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorSummary {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub contact: Option<String>,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub specialization: Option<String>,
    pub blacklisted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub patient_history: Option<String>,
}

/// An appointment as the patient sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientAppointmentView {
    pub id: i64,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub department: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub diagnosis: Option<String>,
}

/// An appointment as the assigned doctor sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorScheduleEntry {
    pub appointment_id: i64,
    pub patient_id: Option<i64>,
    pub patient_name: Option<String>,
    pub patient_history: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignedPatient {
    pub patient_id: i64,
    pub name: String,
    pub history: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentOverview {
    pub id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub department: Option<String>,
    pub patient_id: Option<i64>,
    pub patient_name: Option<String>,
}
