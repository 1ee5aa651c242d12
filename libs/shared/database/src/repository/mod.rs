//! Row-level access to the clinic tables.
//!
//! Every function takes a plain `&Connection` so callers decide the
//! transaction boundary (`Database::transaction`). Results are fully
//! materialized; nothing here loads related rows lazily.

pub mod appointments;
pub mod availability;
pub mod departments;
pub mod doctors;
pub mod history;
pub mod patients;
pub mod users;

use std::str::FromStr;

use rusqlite::types::Type;

pub(crate) fn parse_column<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    escaped.push('%');
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
