use rusqlite::{params, Connection, OptionalExtension, Row};

use shared_models::{Patient, PatientSummary};

use crate::DatabaseError;

const SUMMARY_SELECT: &str = "SELECT p.id, p.user_id, u.username, u.email, u.contact, u.age, u.gender,
        p.patient_history
    FROM patients p
    JOIN users u ON u.id = p.user_id";

fn map_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        user_id: row.get(1)?,
        patient_history: row.get(2)?,
    })
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<PatientSummary> {
    Ok(PatientSummary {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        contact: row.get(4)?,
        age: row.get(5)?,
        gender: row.get(6)?,
        patient_history: row.get(7)?,
    })
}

pub fn insert_patient(conn: &Connection, user_id: i64) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (user_id, patient_history) VALUES (?1, NULL)",
        params![user_id],
    )
    .map_err(DatabaseError::from_write)?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, user_id, patient_history FROM patients WHERE id = ?1",
            params![id],
            map_patient,
        )
        .optional()?)
}

pub fn find_by_user(conn: &Connection, user_id: i64) -> Result<Option<Patient>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, user_id, patient_history FROM patients WHERE user_id = ?1",
            params![user_id],
            map_patient,
        )
        .optional()?)
}

pub fn get_summary(conn: &Connection, id: i64) -> Result<Option<PatientSummary>, DatabaseError> {
    let sql = format!("{SUMMARY_SELECT} WHERE p.id = ?1");
    Ok(conn.query_row(&sql, params![id], map_summary).optional()?)
}

pub fn list_with_users(conn: &Connection) -> Result<Vec<PatientSummary>, DatabaseError> {
    let sql = format!("{SUMMARY_SELECT} ORDER BY u.username");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_summary)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
