use rusqlite::{params, Connection, OptionalExtension, Row};

use shared_models::{Role, User};

use super::{doctors, like_pattern, parse_column};
use crate::DatabaseError;

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.password, u.role, u.contact, u.age, u.gender";

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
    pub contact: Option<&'a str>,
    pub age: Option<i64>,
    pub gender: Option<&'a str>,
}

/// Fields a patient may change on their own account.
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub contact: Option<&'a str>,
    pub age: Option<i64>,
    pub gender: Option<&'a str>,
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: parse_column(4, row.get(4)?)?,
        contact: row.get(5)?,
        age: row.get(6)?,
        gender: row.get(7)?,
    })
}

pub fn insert_user(conn: &Connection, user: &NewUser<'_>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (username, email, password, role, contact, age, gender)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.username,
            user.email,
            user.password,
            user.role.as_str(),
            user.contact,
            user.age,
            user.gender,
        ],
    )
    .map_err(DatabaseError::from_write)?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1");
    Ok(conn.query_row(&sql, params![id], map_user).optional()?)
}

/// Plaintext credential match; password hashing is out of scope for this store.
pub fn find_by_credentials(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1 AND u.password = ?2");
    Ok(conn
        .query_row(&sql, params![username, password], map_user)
        .optional()?)
}

/// First user, other than `exclude_id`, whose username or email collides.
pub fn find_conflicting(
    conn: &Connection,
    username: &str,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<Option<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u
         WHERE (u.username = ?1 OR u.email = ?2) AND (?3 IS NULL OR u.id != ?3)
         LIMIT 1"
    );
    Ok(conn
        .query_row(&sql, params![username, email, exclude_id], map_user)
        .optional()?)
}

pub fn find_first_by_role(conn: &Connection, role: Role) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.role = ?1 ORDER BY u.id LIMIT 1");
    Ok(conn.query_row(&sql, params![role.as_str()], map_user).optional()?)
}

pub fn count_by_role(conn: &Connection, role: Role) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = ?1",
        params![role.as_str()],
        |row| row.get(0),
    )?)
}

pub fn update_profile(
    conn: &Connection,
    id: i64,
    update: &ProfileUpdate<'_>,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE users SET username = ?2, email = ?3, password = ?4, contact = ?5, age = ?6, gender = ?7
             WHERE id = ?1",
            params![
                id,
                update.username,
                update.email,
                update.password,
                update.contact,
                update.age,
                update.gender,
            ],
        )
        .map_err(DatabaseError::from_write)?;
    if changed == 0 {
        return Err(DatabaseError::not_found("user", id));
    }
    Ok(())
}

pub fn update_username_and_contact(
    conn: &Connection,
    id: i64,
    username: &str,
    contact: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE users SET username = ?2, contact = ?3 WHERE id = ?1",
            params![id, username, contact],
        )
        .map_err(DatabaseError::from_write)?;
    if changed == 0 {
        return Err(DatabaseError::not_found("user", id));
    }
    Ok(())
}

/// Delete a user. Doctor and patient profiles go with it (ON DELETE CASCADE);
/// their appointments keep a NULL reference.
pub fn delete_user(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

/// Case-insensitive substring search over username and email. Users behind a
/// blacklisted doctor profile are never returned.
pub fn search(conn: &Connection, query: &str) -> Result<Vec<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u
         LEFT JOIN doctors d ON d.user_id = u.id
         WHERE (u.username LIKE ?1 ESCAPE '\\' OR u.email LIKE ?1 ESCAPE '\\')
           AND {}
         ORDER BY u.username",
        doctors::visible_if_doctor("d")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![like_pattern(query)], map_user)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
