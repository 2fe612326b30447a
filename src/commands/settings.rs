use serde_json::Value;

use crate::db::Database;
use crate::errors::{PosError, Result};

/// Fetch a settings value by key. Values are arbitrary JSON.
pub fn get_setting(db: &Database, key: &str) -> Result<Option<Value>> {
    let conn = db.lock()?;

    let raw: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    match raw {
        Some(s) => {
            let value = serde_json::from_str(&s)
                .map_err(|e| PosError::Internal(format!("corrupt setting '{key}': {e}")))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub fn set_setting(db: &Database, key: &str, value: &Value) -> Result<()> {
    let conn = db.lock()?;

    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        rusqlite::params![key, value.to_string()],
    )?;

    Ok(())
}

pub fn delete_setting(db: &Database, key: &str) -> Result<()> {
    let conn = db.lock()?;

    conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;

    Ok(())
}
