use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::repository::{appointments, departments, doctors, users};
use shared_database::{AppState, Database, DatabaseError};
use shared_models::{Department, Doctor, DoctorSummary, RequestContext, Role};
use shared_utils::validation::{required, validate_contact, validate_email};

use crate::models::{
    CreateDoctorRequest, DepartmentDoctors, DoctorDashboard, DoctorError, UpdateDoctorRequest,
};

pub struct DoctorService {
    db: Database,
    config: Arc<AppConfig>,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            config: state.config.clone(),
        }
    }

    /// Doctor profile behind the calling account.
    pub async fn profile_for(&self, context: &RequestContext) -> Result<Doctor, DoctorError> {
        if context.role != Role::Doctor {
            return Err(DoctorError::NoProfile);
        }
        self.db
            .call(|conn| doctors::find_by_user(conn, context.user_id))
            .await?
            .ok_or(DoctorError::NoProfile)
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>, DoctorError> {
        Ok(self.db.call(departments::list).await?)
    }

    /// Visible doctors of one department.
    pub async fn department_doctors(&self, department_id: i64) -> Result<DepartmentDoctors, DoctorError> {
        self.db
            .call(|conn| {
                let department = departments::get(conn, department_id)?.ok_or(DoctorError::DepartmentNotFound)?;
                let doctors = doctors::list_visible_by_department(conn, department_id)?;
                Ok::<_, DoctorError>(DepartmentDoctors { department, doctors })
            })
            .await
    }

    pub async fn dashboard(&self, doctor_id: i64, today: NaiveDate) -> Result<DoctorDashboard, DoctorError> {
        debug!("Building dashboard for doctor {} on {}", doctor_id, today);

        self.db
            .call(|conn| {
                let doctor = doctors::get_summary(conn, doctor_id)?.ok_or(DoctorError::NotFound)?;
                Ok::<_, DoctorError>(DoctorDashboard {
                    doctor,
                    today,
                    today_schedule: appointments::for_doctor_on(conn, doctor_id, today)?,
                    assigned_patients: appointments::active_patients_for_doctor(conn, doctor_id)?,
                    upcoming: appointments::upcoming_for_doctor(conn, doctor_id, today)?,
                })
            })
            .await
    }

    /// Create a doctor account with the configured default password. The
    /// specialization starts as the department name.
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<DoctorSummary, DoctorError> {
        debug!("Creating doctor account: {}", request.username);

        let username = required("username", &request.username)?;
        let email = required("email", &request.email)?;
        validate_email(email)?;
        validate_contact(request.contact.as_deref())?;

        let summary = self
            .db
            .transaction(|conn| {
                let department = departments::get(conn, request.department_id)?
                    .ok_or(DoctorError::UnknownDepartment(request.department_id))?;

                if users::find_conflicting(conn, username, email, None)?.is_some() {
                    return Err(DoctorError::DuplicateAccount);
                }

                let user_id = users::insert_user(
                    conn,
                    &users::NewUser {
                        username,
                        email,
                        password: &self.config.default_doctor_password,
                        role: Role::Doctor,
                        contact: request.contact.as_deref(),
                        age: None,
                        gender: None,
                    },
                )
                .map_err(duplicate_or_database)?;

                let doctor_id = doctors::insert_doctor(
                    conn,
                    &doctors::NewDoctor {
                        user_id,
                        department_id: Some(department.id),
                        specialization: Some(&department.name),
                    },
                )?;

                doctors::get_summary(conn, doctor_id)?
                    .ok_or_else(|| DatabaseError::not_found("doctor", doctor_id).into())
            })
            .await?;

        info!("Created doctor {} (id {})", summary.username, summary.id);
        Ok(summary)
    }

    pub async fn update_doctor(
        &self,
        doctor_id: i64,
        request: UpdateDoctorRequest,
    ) -> Result<DoctorSummary, DoctorError> {
        let username = required("username", &request.username)?;
        validate_contact(request.contact.as_deref())?;

        let summary = self
            .db
            .transaction(|conn| {
                let doctor = doctors::get_doctor(conn, doctor_id)?.ok_or(DoctorError::NotFound)?;
                let user = users::find_by_id(conn, doctor.user_id)?
                    .ok_or_else(|| DatabaseError::not_found("user", doctor.user_id))?;

                if users::find_conflicting(conn, username, &user.email, Some(user.id))?.is_some() {
                    return Err(DoctorError::DuplicateAccount);
                }

                users::update_username_and_contact(conn, user.id, username, request.contact.as_deref())
                    .map_err(duplicate_or_database)?;
                if let Some(specialization) = request.specialization.as_deref() {
                    doctors::update_specialization(conn, doctor_id, Some(specialization.trim()))?;
                }

                doctors::get_summary(conn, doctor_id)?
                    .ok_or_else(|| DatabaseError::not_found("doctor", doctor_id).into())
            })
            .await?;

        info!("Updated doctor {}", doctor_id);
        Ok(summary)
    }

    /// Remove the doctor's account. The profile and its slots cascade; their
    /// appointments stay with a NULL doctor.
    pub async fn delete_doctor(&self, doctor_id: i64) -> Result<(), DoctorError> {
        self.db
            .transaction(|conn| {
                let doctor = doctors::get_doctor(conn, doctor_id)?.ok_or(DoctorError::NotFound)?;
                users::delete_user(conn, doctor.user_id)?;
                Ok::<_, DoctorError>(())
            })
            .await?;

        info!("Deleted doctor {}", doctor_id);
        Ok(())
    }

    /// Flip the blacklist flag and return its new value.
    pub async fn toggle_blacklist(&self, doctor_id: i64) -> Result<bool, DoctorError> {
        let blacklisted = self
            .db
            .transaction(|conn| doctors::toggle_blacklist(conn, doctor_id))
            .await?
            .ok_or(DoctorError::NotFound)?;

        if blacklisted {
            warn!("Doctor {} blacklisted", doctor_id);
        } else {
            info!("Doctor {} removed from blacklist", doctor_id);
        }
        Ok(blacklisted)
    }
}

fn duplicate_or_database(err: DatabaseError) -> DoctorError {
    if err.is_constraint_violation() {
        DoctorError::DuplicateAccount
    } else {
        DoctorError::Database(err)
    }
}
