use rusqlite::{params, Connection, OptionalExtension, Row};

use shared_models::Department;

use crate::DatabaseError;

fn map_department(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<Department>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM departments ORDER BY id")?;
    let rows = stmt.query_map([], map_department)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Department>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, name, description FROM departments WHERE id = ?1",
            params![id],
            map_department,
        )
        .optional()?)
}

pub fn count(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM departments", [], |row| row.get(0))?)
}

pub fn insert(conn: &Connection, name: &str, description: Option<&str>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO departments (name, description) VALUES (?1, ?2)",
        params![name, description],
    )
    .map_err(DatabaseError::from_write)?;
    Ok(conn.last_insert_rowid())
}
