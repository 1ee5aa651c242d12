use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use shared_models::{
    Appointment, AppointmentOverview, AppointmentStatus, AssignedPatient, DoctorScheduleEntry,
    PatientAppointmentView,
};

use super::{doctors, parse_column};
use crate::DatabaseError;

const APPOINTMENT_COLUMNS: &str = "a.id, a.patient_id, a.doctor_id, a.date, a.time, a.status, a.diagnosis";

/// Status values that hold a (doctor, date, time) slot. Mirrors the
/// partial unique index `ux_appointments_active_slot`.
const ACTIVE_STATUSES: &str = "('Pending', 'Booked')";

const PATIENT_VIEW_SELECT: &str = "SELECT a.id, a.doctor_id, du.username, dep.name, a.date, a.time,
        a.status, a.diagnosis
    FROM appointments a
    LEFT JOIN doctors d ON d.id = a.doctor_id
    LEFT JOIN users du ON du.id = d.user_id
    LEFT JOIN departments dep ON dep.id = d.department_id";

const SCHEDULE_SELECT: &str = "SELECT a.id, a.patient_id, pu.username, p.patient_history, a.date,
        a.time, a.status
    FROM appointments a
    LEFT JOIN patients p ON p.id = a.patient_id
    LEFT JOIN users pu ON pu.id = p.user_id";

pub struct NewAppointment<'a> {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: &'a str,
    pub status: AppointmentStatus,
}

fn map_appointment(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status: parse_column(5, row.get(5)?)?,
        diagnosis: row.get(6)?,
    })
}

fn map_patient_view(row: &Row<'_>) -> rusqlite::Result<PatientAppointmentView> {
    Ok(PatientAppointmentView {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        doctor_name: row.get(2)?,
        department: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        status: parse_column(6, row.get(6)?)?,
        diagnosis: row.get(7)?,
    })
}

fn map_schedule(row: &Row<'_>) -> rusqlite::Result<DoctorScheduleEntry> {
    Ok(DoctorScheduleEntry {
        appointment_id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_name: row.get(2)?,
        patient_history: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        status: parse_column(6, row.get(6)?)?,
    })
}

/// Insert an appointment. A second active appointment for the same
/// (doctor, date, time) fails with `ConstraintViolation` from the unique index.
pub fn insert(conn: &Connection, appointment: &NewAppointment<'_>) -> Result<Appointment, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, date, time, status, diagnosis)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
        params![
            appointment.patient_id,
            appointment.doctor_id,
            appointment.date,
            appointment.time,
            appointment.status.as_str(),
        ],
    )
    .map_err(DatabaseError::from_write)?;

    Ok(Appointment {
        id: conn.last_insert_rowid(),
        patient_id: Some(appointment.patient_id),
        doctor_id: Some(appointment.doctor_id),
        date: appointment.date,
        time: appointment.time.to_string(),
        status: appointment.status,
        diagnosis: None,
    })
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1");
    Ok(conn.query_row(&sql, params![id], map_appointment).optional()?)
}

/// Number of Pending or Booked appointments holding (doctor, date, time).
pub fn count_active_at(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
    time: &str,
) -> Result<i64, DatabaseError> {
    let sql = format!(
        "SELECT COUNT(*) FROM appointments
         WHERE doctor_id = ?1 AND date = ?2 AND time = ?3 AND status IN {ACTIVE_STATUSES}"
    );
    Ok(conn.query_row(&sql, params![doctor_id, date, time], |row| row.get(0))?)
}

/// Set a new status. `diagnosis`, when given, replaces the stored one.
pub fn update_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
    diagnosis: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE appointments SET status = ?2, diagnosis = COALESCE(?3, diagnosis) WHERE id = ?1",
            params![id, status.as_str(), diagnosis],
        )
        .map_err(DatabaseError::from_write)?;
    if changed == 0 {
        return Err(DatabaseError::not_found("appointment", id));
    }
    Ok(())
}

pub fn by_patient(conn: &Connection, patient_id: i64) -> Result<Vec<PatientAppointmentView>, DatabaseError> {
    let sql = format!("{PATIENT_VIEW_SELECT} WHERE a.patient_id = ?1 ORDER BY a.date, a.time, a.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id], map_patient_view)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn completed_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<PatientAppointmentView>, DatabaseError> {
    let sql = format!(
        "{PATIENT_VIEW_SELECT} WHERE a.patient_id = ?1 AND a.status = 'Completed'
         ORDER BY a.date DESC, a.time DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id], map_patient_view)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn for_doctor_on(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
) -> Result<Vec<DoctorScheduleEntry>, DatabaseError> {
    let sql = format!("{SCHEDULE_SELECT} WHERE a.doctor_id = ?1 AND a.date = ?2 ORDER BY a.time, a.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![doctor_id, date], map_schedule)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn upcoming_for_doctor(
    conn: &Connection,
    doctor_id: i64,
    from: NaiveDate,
) -> Result<Vec<DoctorScheduleEntry>, DatabaseError> {
    let sql = format!("{SCHEDULE_SELECT} WHERE a.doctor_id = ?1 AND a.date >= ?2 ORDER BY a.date, a.time, a.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![doctor_id, from], map_schedule)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Patients holding at least one active appointment with the doctor.
pub fn active_patients_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<AssignedPatient>, DatabaseError> {
    let sql = format!(
        "SELECT DISTINCT p.id, u.username, p.patient_history
         FROM appointments a
         JOIN patients p ON p.id = a.patient_id
         JOIN users u ON u.id = p.user_id
         WHERE a.doctor_id = ?1 AND a.status IN {ACTIVE_STATUSES}
         ORDER BY u.username"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![doctor_id], |row| {
        Ok(AssignedPatient {
            patient_id: row.get(0)?,
            name: row.get(1)?,
            history: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Every appointment whose doctor is still visible, with names resolved.
pub fn with_visible_doctors(conn: &Connection) -> Result<Vec<AppointmentOverview>, DatabaseError> {
    let sql = format!(
        "SELECT a.id, a.date, a.time, a.status, a.doctor_id, du.username, dep.name,
                a.patient_id, pu.username
         FROM appointments a
         JOIN doctors d ON d.id = a.doctor_id
         JOIN users du ON du.id = d.user_id
         LEFT JOIN departments dep ON dep.id = d.department_id
         LEFT JOIN patients p ON p.id = a.patient_id
         LEFT JOIN users pu ON pu.id = p.user_id
         WHERE {}
         ORDER BY a.date, a.time, a.id",
        doctors::visible_doctor("d")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(AppointmentOverview {
            id: row.get(0)?,
            date: row.get(1)?,
            time: row.get(2)?,
            status: parse_column(3, row.get(3)?)?,
            doctor_id: row.get(4)?,
            doctor_name: row.get(5)?,
            department: row.get(6)?,
            patient_id: row.get(7)?,
            patient_name: row.get(8)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn count(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?)
}
