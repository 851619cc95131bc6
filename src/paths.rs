//! Project path functions - single source of truth for all file paths.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//! - `PORT`: Override the server port (see config.rs)

use std::env;
use std::sync::OnceLock;

/// Lazily initialized data directory from DATA_DIR env var
static DATA_DIR_VALUE: OnceLock<String> = OnceLock::new();

/// Get the base data directory (from DATA_DIR env var or default "data")
pub fn data_dir() -> &'static str {
    DATA_DIR_VALUE.get_or_init(|| env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// SQLite database path (users, plans, quizzes, groups, conversations)
pub fn db_path() -> String {
    format!("{}/studyhub.db", data_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_default() {
        // Can't test env override due to OnceLock, but verify it returns a value
        let dir = data_dir();
        assert!(!dir.is_empty());
    }

    #[test]
    fn test_db_path_format() {
        let path = db_path();
        assert!(path.ends_with("/studyhub.db"));
    }
}
