use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use shared_models::AvailabilitySlot;

use crate::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NewSlot {
    pub date: NaiveDate,
    pub time_slot: String,
}

fn map_slot(row: &Row<'_>) -> rusqlite::Result<AvailabilitySlot> {
    Ok(AvailabilitySlot {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        date: row.get(2)?,
        time_slot: row.get(3)?,
        is_available: row.get(4)?,
    })
}

/// Delete every slot of `doctor_id`, then insert `slots` as available.
/// Must run inside a transaction so readers never see the empty middle state.
pub fn replace_for_doctor(
    conn: &Connection,
    doctor_id: i64,
    slots: &[NewSlot],
) -> Result<usize, DatabaseError> {
    conn.execute(
        "DELETE FROM availability_slots WHERE doctor_id = ?1",
        params![doctor_id],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO availability_slots (doctor_id, date, time_slot, is_available)
         VALUES (?1, ?2, ?3, 1)",
    )?;
    for slot in slots {
        stmt.execute(params![doctor_id, slot.date, slot.time_slot])
            .map_err(DatabaseError::from_write)?;
    }
    Ok(slots.len())
}

pub fn list_open(conn: &Connection, doctor_id: i64) -> Result<Vec<AvailabilitySlot>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, doctor_id, date, time_slot, is_available FROM availability_slots
         WHERE doctor_id = ?1 AND is_available = 1
         ORDER BY date, time_slot",
    )?;
    let rows = stmt.query_map(params![doctor_id], map_slot)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn find_open_slot(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
    time_slot: &str,
) -> Result<Option<AvailabilitySlot>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, doctor_id, date, time_slot, is_available FROM availability_slots
             WHERE doctor_id = ?1 AND date = ?2 AND time_slot = ?3 AND is_available = 1",
            params![doctor_id, date, time_slot],
            map_slot,
        )
        .optional()?)
}
