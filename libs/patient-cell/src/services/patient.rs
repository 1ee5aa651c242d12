use chrono::Utc;
use tracing::{debug, info};

use shared_database::repository::history::{self, NewHistoryRecord};
use shared_database::repository::{appointments, departments, doctors, patients, users};
use shared_database::{AppState, Database, DatabaseError};
use shared_models::{HistoryRecord, Patient, RequestContext, Role, User};
use shared_utils::validation::{required, validate_age, validate_contact, validate_email};

use crate::models::{
    AddHistoryRequest, HistoryContext, PatientDashboard, PatientError, PatientHistoryView,
    UpdateProfileRequest,
};

pub struct PatientService {
    db: Database,
}

impl PatientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    /// Patient profile behind the calling account.
    pub async fn profile_for(&self, context: &RequestContext) -> Result<Patient, PatientError> {
        if context.role != Role::Patient {
            return Err(PatientError::NoProfile);
        }
        self.db
            .call(|conn| patients::find_by_user(conn, context.user_id))
            .await?
            .ok_or(PatientError::NoProfile)
    }

    pub async fn dashboard(&self, context: &RequestContext) -> Result<PatientDashboard, PatientError> {
        let patient = self.profile_for(context).await?;
        debug!("Building dashboard for patient {}", patient.id);

        self.db
            .call(|conn| {
                let user = users::find_by_id(conn, context.user_id)?
                    .ok_or_else(|| DatabaseError::not_found("user", context.user_id))?;
                Ok::<_, PatientError>(PatientDashboard {
                    user,
                    departments: departments::list(conn)?,
                    appointments: appointments::by_patient(conn, patient.id)?,
                    patient,
                })
            })
            .await
    }

    /// Edit the caller's own account. Username and email must stay unique
    /// across all other users.
    pub async fn update_profile(
        &self,
        context: &RequestContext,
        request: UpdateProfileRequest,
    ) -> Result<User, PatientError> {
        self.profile_for(context).await?;

        let username = required("username", &request.username)?;
        let email = required("email", &request.email)?;
        validate_email(email)?;
        validate_contact(request.contact.as_deref())?;
        validate_age(request.age)?;
        let new_password = request
            .password
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let user = self
            .db
            .transaction(|conn| {
                let current = users::find_by_id(conn, context.user_id)?
                    .ok_or_else(|| DatabaseError::not_found("user", context.user_id))?;

                if users::find_conflicting(conn, username, email, Some(current.id))?.is_some() {
                    return Err(PatientError::DuplicateAccount);
                }

                users::update_profile(
                    conn,
                    current.id,
                    &users::ProfileUpdate {
                        username,
                        email,
                        password: new_password.unwrap_or(current.password.as_str()),
                        contact: request.contact.as_deref(),
                        age: request.age,
                        gender: request.gender.as_deref(),
                    },
                )
                .map_err(|e| {
                    if e.is_constraint_violation() {
                        PatientError::DuplicateAccount
                    } else {
                        PatientError::Database(e)
                    }
                })?;

                users::find_by_id(conn, current.id)?
                    .ok_or_else(|| DatabaseError::not_found("user", current.id).into())
            })
            .await?;

        info!("Patient user {} updated their profile", user.id);
        Ok(user)
    }

    /// History records newest first, plus completed appointments.
    pub async fn history(&self, context: &RequestContext) -> Result<PatientHistoryView, PatientError> {
        let patient = self.profile_for(context).await?;

        self.db
            .call(|conn| {
                Ok::<_, PatientError>(PatientHistoryView {
                    history: history::list_for_patient(conn, patient.id)?,
                    past_appointments: appointments::completed_for_patient(conn, patient.id)?,
                })
            })
            .await
    }

    pub async fn history_context(
        &self,
        context: &RequestContext,
        patient_id: i64,
    ) -> Result<HistoryContext, PatientError> {
        if context.role != Role::Doctor {
            return Err(PatientError::NotADoctor);
        }

        self.db
            .call(|conn| {
                let patient = patients::get_summary(conn, patient_id)?.ok_or(PatientError::NotFound)?;
                let doctor = doctors::find_by_user(conn, context.user_id)?.ok_or(PatientError::NotADoctor)?;
                let summary = doctors::get_summary(conn, doctor.id)?
                    .ok_or_else(|| DatabaseError::not_found("doctor", doctor.id))?;

                Ok::<_, PatientError>(HistoryContext {
                    patient_id: patient.id,
                    patient_name: patient.username,
                    doctor_name: summary.username,
                    department: summary.department_name.unwrap_or_else(|| "N/A".to_string()),
                })
            })
            .await
    }

    /// Append a history record authored by the calling doctor. Records are
    /// never edited or removed afterwards.
    pub async fn add_history(
        &self,
        context: &RequestContext,
        patient_id: i64,
        request: AddHistoryRequest,
    ) -> Result<HistoryRecord, PatientError> {
        if context.role != Role::Doctor {
            return Err(PatientError::NotADoctor);
        }
        let visit_type = required("visit_type", &request.visit_type)?;
        let diagnosis = required("diagnosis", &request.diagnosis)?;

        let record = self
            .db
            .transaction(|conn| {
                if patients::get_patient(conn, patient_id)?.is_none() {
                    return Err(PatientError::NotFound);
                }
                Ok(history::insert_record(
                    conn,
                    &NewHistoryRecord {
                        patient_id,
                        visit_type: Some(visit_type),
                        diagnosis: Some(diagnosis),
                        created_by: context.user_id,
                        created_at: Utc::now(),
                    },
                )?)
            })
            .await?;

        info!("Doctor user {} added history record {} for patient {}", context.user_id, record.id, patient_id);
        Ok(record)
    }
}
