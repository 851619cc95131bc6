//! Application configuration.
//!
//! This module centralizes all configurable values. File-based settings come
//! from config.toml, overridable via environment (.env is loaded first).

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

// ==================== Database Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    ai: Option<AiFileConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiFileConfig {
    provider_order: Option<String>,
    openai_model: Option<String>,
    gemini_model: Option<String>,
}

fn read_config_file() -> Option<AppConfig> {
    let contents = std::fs::read_to_string("config.toml").ok()?;
    toml::from_str::<AppConfig>(&contents).ok()
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    if let Some(config) = read_config_file() {
        if let Some(path) = config.database.and_then(|db| db.path) {
            tracing::info!("Using database from config.toml: {}", path);
            return PathBuf::from(path);
        }
    }

    // Priority 2: .env DATABASE_PATH
    if let Ok(path) = env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default
    let default = PathBuf::from(crate::paths::db_path());
    tracing::info!("Using default database path: {}", default.display());
    default
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Default server port (override with PORT env var)
pub const SERVER_PORT: u16 = 3000;

/// Get the server port (PORT env var or default)
pub fn server_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(SERVER_PORT)
}

/// Get the full server bind address
pub fn server_bind_addr() -> String {
    format!("{}:{}", SERVER_ADDR, server_port())
}

// ==================== Session Configuration ====================

/// Auth session lifetime in hours (1 week)
pub const SESSION_DURATION_HOURS: i64 = 24 * 7;

/// Length of the plaintext bearer token in characters
pub const SESSION_TOKEN_LEN: usize = 48;

/// Probability threshold for expired-session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

/// Idle expiry for in-memory study sessions, in hours
pub const STUDY_SESSION_EXPIRY_HOURS: i64 = 6;

// ==================== AI Provider Configuration ====================

/// Default provider chain order
pub const DEFAULT_PROVIDER_ORDER: &str = "openai,gemini";

/// Default OpenAI chat model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Resolved AI settings used to build the provider chain
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Provider names in fallback order
    pub provider_order: Vec<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

/// Load AI settings: config.toml > env > defaults. API keys are env-only.
pub fn load_ai_config() -> AiConfig {
    let _ = dotenvy::dotenv();
    let file = read_config_file().and_then(|c| c.ai);

    let order_raw = file
        .as_ref()
        .and_then(|a| a.provider_order.clone())
        .or_else(|| env::var("AI_PROVIDER_ORDER").ok())
        .unwrap_or_else(|| DEFAULT_PROVIDER_ORDER.to_string());

    let provider_order = order_raw
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    AiConfig {
        provider_order,
        openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
        openai_model: file
            .as_ref()
            .and_then(|a| a.openai_model.clone())
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
        gemini_model: file
            .as_ref()
            .and_then(|a| a.gemini_model.clone())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
    }
}

// ==================== Content Limits ====================

/// Maximum study plan length in days
pub const MAX_PLAN_DURATION_DAYS: i64 = 90;

/// Maximum questions in a generated quiz
pub const MAX_QUIZ_QUESTIONS: i64 = 25;

/// Maximum group message body length
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Default page size for group message history
pub const DEFAULT_MESSAGE_LIMIT: i64 = 50;
