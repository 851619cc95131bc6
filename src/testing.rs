//! Test utilities for database setup.
//!
//! Provides helpers that reuse the authoritative schema migrations,
//! eliminating schema duplication in test code.

use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

/// Test environment with a fully migrated database in a temporary directory.
///
/// The directory is cleaned up automatically when the environment drops.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    /// Database connection with the full schema applied
    pub conn: Connection,
}

impl TestEnv {
    /// Create a test environment with a migrated database.
    ///
    /// Runs `crate::db::schema::run_migrations()`, the same function
    /// production startup uses.
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let db_path = temp.path().join("studyhub.db");
        let conn = Connection::open(&db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        crate::db::schema::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Insert a user row directly and return its id.
    ///
    /// Email is derived from the username; the password hash is a dummy
    /// value, so this user cannot log in through the handlers.
    pub fn create_user(&self, username: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO users (username, email, password_hash, created_at)
                 VALUES (?1, ?2, 'x', datetime('now'))",
                rusqlite::params![username, format!("{username}@example.com")],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}
