use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use shared_models::HistoryRecord;

use crate::DatabaseError;

pub struct NewHistoryRecord<'a> {
    pub patient_id: i64,
    pub visit_type: Option<&'a str>,
    pub diagnosis: Option<&'a str>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        visit_type: row.get(2)?,
        diagnosis: row.get(3)?,
        created_by: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// History rows are append-only; there is no update or delete.
pub fn insert_record(
    conn: &Connection,
    record: &NewHistoryRecord<'_>,
) -> Result<HistoryRecord, DatabaseError> {
    conn.execute(
        "INSERT INTO patient_history (patient_id, visit_type, diagnosis, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.patient_id,
            record.visit_type,
            record.diagnosis,
            record.created_by,
            record.created_at,
        ],
    )
    .map_err(DatabaseError::from_write)?;

    Ok(HistoryRecord {
        id: conn.last_insert_rowid(),
        patient_id: record.patient_id,
        visit_type: record.visit_type.map(str::to_string),
        diagnosis: record.diagnosis.map(str::to_string),
        created_by: Some(record.created_by),
        created_at: record.created_at,
    })
}

/// Newest first.
pub fn list_for_patient(conn: &Connection, patient_id: i64) -> Result<Vec<HistoryRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, visit_type, diagnosis, created_by, created_at
         FROM patient_history WHERE patient_id = ?1
         ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![patient_id], map_record)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
