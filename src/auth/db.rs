//! Auth database operations (users and sessions tables).

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

/// Public view of a user row
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

/// Create a new user, returns the user ID
pub fn create_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (username, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![username, email, password_hash, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get user by username, returns (user_id, password_hash)
pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<(i64, String)>> {
    conn.query_row(
        "SELECT id, password_hash FROM users WHERE username = ?1",
        params![username],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

/// Get a user's public info by ID
pub fn get_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<UserInfo>> {
    conn.query_row(
        "SELECT id, username, email, created_at FROM users WHERE id = ?1",
        params![user_id],
        |row| {
            Ok(UserInfo {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
}

/// Check if a username already exists (case-insensitive via COLLATE NOCASE)
pub fn username_exists(conn: &Connection, username: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Check if an email is already registered
pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Update user's last login timestamp
pub fn update_last_login(conn: &Connection, user_id: i64) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
        params![now, user_id],
    )?;
    Ok(())
}

/// Create a new session keyed by the token digest
pub fn create_session(
    conn: &Connection,
    user_id: i64,
    token_hash: &str,
    duration_hours: i64,
) -> Result<()> {
    let now = Utc::now();
    let expires = now + Duration::hours(duration_hours);
    conn.execute(
        r#"INSERT INTO sessions (token_hash, user_id, created_at, expires_at, last_access_at)
           VALUES (?1, ?2, ?3, ?4, ?5)"#,
        params![
            token_hash,
            user_id,
            now.to_rfc3339(),
            expires.to_rfc3339(),
            now.to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Validate a session and get user info, returns (user_id, username).
/// Touches last_access_at on success.
pub fn get_session_user(conn: &Connection, token_hash: &str) -> Result<Option<(i64, String)>> {
    let now = Utc::now().to_rfc3339();
    let result = conn
        .query_row(
            r#"SELECT u.id, u.username
               FROM sessions s
               JOIN users u ON s.user_id = u.id
               WHERE s.token_hash = ?1 AND s.expires_at > ?2"#,
            params![token_hash, now],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    if result.is_some() {
        let _ = conn.execute(
            "UPDATE sessions SET last_access_at = ?1 WHERE token_hash = ?2",
            params![now, token_hash],
        );
    }
    Ok(result)
}

/// Delete a session (logout)
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(())
}

/// Cleanup expired sessions, returns count of deleted sessions
pub fn cleanup_expired_sessions(conn: &Connection) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])?;
    Ok(count)
}
