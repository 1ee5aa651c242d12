use rusqlite::{params, Connection, OptionalExtension, Row};

use shared_models::{Doctor, DoctorSummary};

use crate::DatabaseError;

/// The blacklist, expressed once. Any query that surfaces a doctor to a
/// patient, to admin listings, or to login must filter through one of
/// these predicates.
pub fn visible_doctor(alias: &str) -> String {
    format!("{alias}.blacklisted = 0")
}

/// Like [`visible_doctor`] for outer joins where the row may not be a doctor.
pub fn visible_if_doctor(alias: &str) -> String {
    format!("({alias}.id IS NULL OR {alias}.blacklisted = 0)")
}

const SUMMARY_SELECT: &str = "SELECT d.id, d.user_id, u.username, u.email, u.contact,
        d.department_id, dep.name, d.specialization, d.blacklisted
    FROM doctors d
    JOIN users u ON u.id = d.user_id
    LEFT JOIN departments dep ON dep.id = d.department_id";

pub struct NewDoctor<'a> {
    pub user_id: i64,
    pub department_id: Option<i64>,
    pub specialization: Option<&'a str>,
}

fn map_doctor(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        user_id: row.get(1)?,
        department_id: row.get(2)?,
        specialization: row.get(3)?,
        blacklisted: row.get(4)?,
    })
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<DoctorSummary> {
    Ok(DoctorSummary {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        contact: row.get(4)?,
        department_id: row.get(5)?,
        department_name: row.get(6)?,
        specialization: row.get(7)?,
        blacklisted: row.get(8)?,
    })
}

pub fn insert_doctor(conn: &Connection, doctor: &NewDoctor<'_>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (user_id, department_id, specialization, blacklisted)
         VALUES (?1, ?2, ?3, 0)",
        params![doctor.user_id, doctor.department_id, doctor.specialization],
    )
    .map_err(DatabaseError::from_write)?;
    Ok(conn.last_insert_rowid())
}

/// Raw doctor row regardless of blacklist state. Admin paths only.
pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, user_id, department_id, specialization, blacklisted FROM doctors WHERE id = ?1",
            params![id],
            map_doctor,
        )
        .optional()?)
}

pub fn find_by_user(conn: &Connection, user_id: i64) -> Result<Option<Doctor>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, user_id, department_id, specialization, blacklisted FROM doctors WHERE user_id = ?1",
            params![user_id],
            map_doctor,
        )
        .optional()?)
}

/// Summary of a doctor that is currently visible (not blacklisted).
pub fn get_visible_summary(conn: &Connection, id: i64) -> Result<Option<DoctorSummary>, DatabaseError> {
    let sql = format!("{SUMMARY_SELECT} WHERE d.id = ?1 AND {}", visible_doctor("d"));
    Ok(conn.query_row(&sql, params![id], map_summary).optional()?)
}

/// Summary of any doctor, blacklisted or not. Admin paths only.
pub fn get_summary(conn: &Connection, id: i64) -> Result<Option<DoctorSummary>, DatabaseError> {
    let sql = format!("{SUMMARY_SELECT} WHERE d.id = ?1");
    Ok(conn.query_row(&sql, params![id], map_summary).optional()?)
}

pub fn list_visible(conn: &Connection) -> Result<Vec<DoctorSummary>, DatabaseError> {
    let sql = format!("{SUMMARY_SELECT} WHERE {} ORDER BY u.username", visible_doctor("d"));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_summary)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_visible_by_department(
    conn: &Connection,
    department_id: i64,
) -> Result<Vec<DoctorSummary>, DatabaseError> {
    let sql = format!(
        "{SUMMARY_SELECT} WHERE d.department_id = ?1 AND {} ORDER BY u.username",
        visible_doctor("d")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![department_id], map_summary)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn count_visible(conn: &Connection) -> Result<i64, DatabaseError> {
    let sql = format!(
        "SELECT COUNT(*) FROM doctors d JOIN users u ON u.id = d.user_id
         WHERE u.role = 'doctor' AND {}",
        visible_doctor("d")
    );
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

/// True when `user_id` belongs to a blacklisted doctor profile.
pub fn is_blacklisted_user(conn: &Connection, user_id: i64) -> Result<bool, DatabaseError> {
    let sql = format!(
        "SELECT COUNT(*) FROM doctors d WHERE d.user_id = ?1 AND NOT ({})",
        visible_doctor("d")
    );
    let hidden: i64 = conn.query_row(&sql, params![user_id], |row| row.get(0))?;
    Ok(hidden > 0)
}

/// Flip the blacklist flag, returning the new value or `None` for an unknown doctor.
pub fn toggle_blacklist(conn: &Connection, id: i64) -> Result<Option<bool>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET blacklisted = NOT blacklisted WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    let flag: bool = conn.query_row(
        "SELECT blacklisted FROM doctors WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(Some(flag))
}

pub fn update_specialization(
    conn: &Connection,
    id: i64,
    specialization: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET specialization = ?2 WHERE id = ?1",
        params![id, specialization],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("doctor", id));
    }
    Ok(())
}
