use chrono::Local;

use crate::db::{fmt_ts, parse_enum, parse_ts, Database};
use crate::errors::{PosError, Result};
use crate::models::{CreateUser, Session, User, UserRole};

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role: String = row.get(2)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        role: parse_enum(UserRole::parse(&role), &role)?,
        pin: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn get_users(db: &Database) -> Result<Vec<User>> {
    let conn = db.lock()?;

    let mut stmt = conn
        .prepare("SELECT id, name, role, pin, is_active, created_at FROM users ORDER BY name")?;

    let users = stmt
        .query_map([], row_to_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(users)
}

pub fn create_user(db: &Database, user: CreateUser) -> Result<User> {
    if user.name.trim().is_empty() {
        return Err(PosError::InvalidArgument(
            "user name must not be empty".to_string(),
        ));
    }

    let conn = db.lock()?;

    conn.execute(
        "INSERT INTO users (name, role, pin) VALUES (?1, ?2, ?3)",
        rusqlite::params![user.name, user.role.as_str(), user.pin],
    )?;

    let id = conn.last_insert_rowid();

    let user = conn.query_row(
        "SELECT id, name, role, pin, is_active, created_at FROM users WHERE id = ?1",
        [id],
        row_to_user,
    )?;

    Ok(user)
}

pub fn deactivate_user(db: &Database, id: i64) -> Result<()> {
    let conn = db.lock()?;

    let changed = conn.execute("UPDATE users SET is_active = 0 WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(PosError::NotFound(format!("user {id}")));
    }

    Ok(())
}

/// Start an explicit session for a user. A user with no PIN logs in
/// without one; otherwise the PIN must match.
pub fn login(db: &Database, user_id: i64, pin: Option<&str>) -> Result<Session> {
    let conn = db.lock()?;

    let (stored_pin, is_active): (Option<String>, bool) = conn
        .query_row(
            "SELECT pin, is_active FROM users WHERE id = ?1",
            [user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|_| PosError::NotFound(format!("user {user_id}")))?;

    if !is_active {
        return Err(PosError::Conflict(format!("user {user_id} is deactivated")));
    }

    if let Some(expected) = stored_pin {
        if pin != Some(expected.as_str()) {
            return Err(PosError::InvalidArgument("incorrect PIN".to_string()));
        }
    }

    let now = Local::now().naive_local();
    conn.execute(
        "INSERT INTO sessions (user_id, started_at) VALUES (?1, ?2)",
        rusqlite::params![user_id, fmt_ts(now)],
    )?;

    let session = Session {
        id: conn.last_insert_rowid(),
        user_id,
        started_at: now,
        ended_at: None,
    };

    tracing::info!(user_id, session_id = session.id, "session started");
    Ok(session)
}

/// End a session. Ending an already-ended session is a conflict.
pub fn logout(db: &Database, session_id: i64) -> Result<Session> {
    let conn = db.lock()?;

    let ended: Option<String> = conn
        .query_row(
            "SELECT ended_at FROM sessions WHERE id = ?1",
            [session_id],
            |row| row.get(0),
        )
        .map_err(|_| PosError::NotFound(format!("session {session_id}")))?;

    if ended.is_some() {
        return Err(PosError::Conflict(format!(
            "session {session_id} is already ended"
        )));
    }

    let now = Local::now().naive_local();
    conn.execute(
        "UPDATE sessions SET ended_at = ?1 WHERE id = ?2",
        rusqlite::params![fmt_ts(now), session_id],
    )?;

    let session = conn.query_row(
        "SELECT id, user_id, started_at, ended_at FROM sessions WHERE id = ?1",
        [session_id],
        |row| {
            let started_at: String = row.get(2)?;
            let ended_at: Option<String> = row.get(3)?;
            Ok(Session {
                id: row.get(0)?,
                user_id: row.get(1)?,
                started_at: parse_ts(&started_at)?,
                ended_at: match ended_at {
                    Some(ts) => Some(parse_ts(&ts)?),
                    None => None,
                },
            })
        },
    )?;

    tracing::info!(session_id, "session ended");
    Ok(session)
}
