use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use doctor_cell::TimeBand;
use shared_database::repository::{appointments, availability, doctors, patients};
use shared_database::{AppState, Database};
use shared_models::{Appointment, AppointmentStatus, RequestContext, Role};
use shared_utils::validation::parse_date;

use crate::models::{AppointmentError, BookAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycleService;

/// Booking engine: creates appointments against open slots and moves them
/// through the lifecycle on behalf of their owners.
pub struct AppointmentBookingService {
    db: Database,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Patient profile id of the calling account.
    pub async fn patient_for(&self, context: &RequestContext) -> Result<i64, AppointmentError> {
        if context.role != Role::Patient {
            return Err(AppointmentError::UnauthorizedAccess);
        }
        self.db
            .call(|conn| patients::find_by_user(conn, context.user_id))
            .await?
            .map(|patient| patient.id)
            .ok_or(AppointmentError::PatientNotFound)
    }

    /// Book `(doctor, date, time)` for a patient.
    ///
    /// Runs as one transaction: the doctor must be visible, the slot open, and
    /// no active appointment may hold the same (doctor, date, time). If two
    /// requests race past the check, the active-slot unique index rejects the
    /// second insert and it is reported as a conflict too.
    ///
    /// The slot stays listed as open after booking.
    pub async fn book(
        &self,
        patient_id: i64,
        doctor_id: i64,
        date: NaiveDate,
        time: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking doctor {} on {} {} for patient {}", doctor_id, date, time, patient_id);

        let band = TimeBand::from_label(time.trim())
            .or_else(|| TimeBand::from_key(time.trim()))
            .ok_or_else(|| AppointmentError::UnknownTimeSlot(time.to_string()))?;
        let status = self.lifecycle.initial_status();

        let appointment = self
            .db
            .transaction(|conn| {
                if doctors::get_visible_summary(conn, doctor_id)?.is_none() {
                    return Err(AppointmentError::DoctorNotFound);
                }
                if patients::get_patient(conn, patient_id)?.is_none() {
                    return Err(AppointmentError::PatientNotFound);
                }
                if availability::find_open_slot(conn, doctor_id, date, band.label())?.is_none() {
                    return Err(AppointmentError::SlotNotAvailable);
                }
                if appointments::count_active_at(conn, doctor_id, date, band.label())? > 0 {
                    return Err(AppointmentError::ConflictDetected);
                }

                appointments::insert(
                    conn,
                    &appointments::NewAppointment {
                        patient_id,
                        doctor_id,
                        date,
                        time: band.label(),
                        status,
                    },
                )
                .map_err(|e| {
                    if e.is_constraint_violation() {
                        AppointmentError::ConflictDetected
                    } else {
                        AppointmentError::Database(e)
                    }
                })
            })
            .await
            .inspect_err(|e| warn!("Booking rejected for doctor {} on {} {}: {}", doctor_id, date, band, e))?;

        info!(
            "Appointment {} booked: patient {} with doctor {} on {} {}",
            appointment.id, patient_id, doctor_id, date, band
        );
        Ok(appointment)
    }

    /// Parse the request fields and book for the calling patient.
    pub async fn book_for(
        &self,
        context: &RequestContext,
        request: &BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let date = parse_date("date", &request.date)?;
        let patient_id = self.patient_for(context).await?;
        self.book(patient_id, request.doctor_id, date, &request.time).await
    }

    /// Cancel on behalf of the owning patient or the assigned doctor.
    pub async fn cancel(&self, context: &RequestContext, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        debug!("User {} cancelling appointment {}", context.user_id, appointment_id);

        let appointment = self
            .transition(context, appointment_id, AppointmentStatus::Cancelled, None, &[Role::Patient, Role::Doctor])
            .await?;

        info!("Appointment {} cancelled by {} {}", appointment_id, context.role, context.user_id);
        Ok(appointment)
    }

    /// Complete on behalf of the assigned doctor, optionally recording a diagnosis.
    pub async fn complete(
        &self,
        context: &RequestContext,
        appointment_id: i64,
        diagnosis: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("User {} completing appointment {}", context.user_id, appointment_id);

        let diagnosis = diagnosis.map(str::trim).filter(|d| !d.is_empty());
        let appointment = self
            .transition(context, appointment_id, AppointmentStatus::Completed, diagnosis, &[Role::Doctor])
            .await?;

        info!("Appointment {} completed by doctor user {}", appointment_id, context.user_id);
        Ok(appointment)
    }

    /// Visible to the owning patient, the assigned doctor and admins.
    pub async fn get(&self, context: &RequestContext, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        self.db
            .call(|conn| {
                let appointment = appointments::get(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
                if !context.is_admin() {
                    authorize(conn, context, &appointment, &[Role::Patient, Role::Doctor])?;
                }
                Ok::<_, AppointmentError>(appointment)
            })
            .await
    }

    async fn transition(
        &self,
        context: &RequestContext,
        appointment_id: i64,
        to: AppointmentStatus,
        diagnosis: Option<&str>,
        roles: &[Role],
    ) -> Result<Appointment, AppointmentError> {
        self.db
            .transaction(|conn| {
                let appointment = appointments::get(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
                authorize(conn, context, &appointment, roles)?;
                self.lifecycle.validate_status_transition(appointment.status, to)?;

                appointments::update_status(conn, appointment_id, to, diagnosis)?;
                appointments::get(conn, appointment_id)?.ok_or(AppointmentError::NotFound)
            })
            .await
    }
}

/// The caller must act in one of `roles` and be the party the appointment
/// names for that role.
fn authorize(
    conn: &Connection,
    context: &RequestContext,
    appointment: &Appointment,
    roles: &[Role],
) -> Result<(), AppointmentError> {
    if !roles.contains(&context.role) {
        return Err(AppointmentError::UnauthorizedAccess);
    }

    let owner = match context.role {
        Role::Patient => patients::find_by_user(conn, context.user_id)?
            .is_some_and(|patient| appointment.patient_id == Some(patient.id)),
        Role::Doctor => doctors::find_by_user(conn, context.user_id)?
            .is_some_and(|doctor| appointment.doctor_id == Some(doctor.id)),
        Role::Admin => false,
    };

    if !owner {
        return Err(AppointmentError::UnauthorizedAccess);
    }
    Ok(())
}
