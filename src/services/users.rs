use crate::db::{format_time, time_from_row};
use crate::error::{check_length, check_required, BlogError};
use crate::models::{User, USERNAME_MAX_LEN};
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;

const USER_COLUMNS: &str = "id, username, email, created_at";

pub fn create_user(db: &Database, username: &str, email: &str) -> Result<i64> {
    check_required("username", username, USERNAME_MAX_LEN)?;
    check_length("email", email, 254)?;

    if get_user_by_username(db, username)?.is_some() {
        return Err(BlogError::validation("username", format!("'{}' is already taken", username)).into());
    }

    let conn = db.get()?;
    conn.execute(
        "INSERT INTO users (username, email, created_at) VALUES (?, ?, ?)",
        (username, email, format_time(&chrono::Utc::now())),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user_by_username(db: &Database, username: &str) -> Result<Option<User>> {
    let conn = db.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
            [username],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn list_users(db: &Database) -> Result<Vec<User>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users ORDER BY username",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Removes the user and, through the foreign key, every post they wrote.
pub fn delete_user(db: &Database, id: i64) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute("DELETE FROM users WHERE id = ?", [id])?;
    Ok(affected > 0)
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        created_at: time_from_row(row, 3)?,
    })
}
