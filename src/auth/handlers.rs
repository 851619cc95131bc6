//! Authentication handlers for register, login, logout and profile.

use axum::{extract::State, Json};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::db as auth_db;
use super::middleware::AuthUser;
use super::password;
use crate::config;
use crate::db::{self, LogOnError};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: ProfileResponse,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

/// Generate a random alphanumeric bearer token
fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..config::SESSION_TOKEN_LEN)
        .map(|_| {
            let idx = rng.random_range(0..62);
            match idx {
                0..=9 => (b'0' + idx) as char,
                10..=35 => (b'a' + idx - 10) as char,
                _ => (b'A' + idx - 36) as char,
            }
        })
        .collect()
}

/// Validate username: 3-32 chars, alphanumeric or underscore
fn is_valid_username(username: &str) -> bool {
    username.len() >= 3
        && username.len() <= 32
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Minimal email sanity check; real validation happens on delivery
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && email.len() <= 100
}

fn profile_from(info: auth_db::UserInfo) -> ProfileResponse {
    ProfileResponse {
        id: info.id,
        username: info.username,
        email: info.email,
        created_at: info.created_at,
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if !is_valid_username(&req.username) {
        return Err(AppError::bad_request(
            "username must be 3-32 alphanumeric characters or underscores",
        ));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::bad_request("invalid email address"));
    }
    if req.password.len() < 8 {
        return Err(AppError::bad_request(
            "password must be at least 8 characters",
        ));
    }

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;

    let conn = db::try_lock(&state.db)?;

    if auth_db::username_exists(&conn, &req.username)? {
        return Err(AppError::bad_request("username already exists"));
    }
    if auth_db::email_exists(&conn, &req.email)? {
        return Err(AppError::bad_request("email already registered"));
    }

    let user_id = auth_db::create_user(&conn, &req.username, &req.email, &password_hash)?;
    tracing::info!("registered user {} (id {})", req.username, user_id);

    let token = generate_token();
    auth_db::create_session(
        &conn,
        user_id,
        &password::token_digest(&token),
        config::SESSION_DURATION_HOURS,
    )?;

    let info = auth_db::get_user_by_id(&conn, user_id)?
        .ok_or_else(|| AppError::Internal("user vanished after insert".to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: profile_from(info),
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }

    let conn = db::try_lock(&state.db)?;

    // Same error for unknown user and bad password
    let (user_id, stored_hash) = auth_db::get_user_by_username(&conn, &req.username)?
        .ok_or_else(|| AppError::bad_request("invalid username or password"))?;

    if !password::verify_password(&req.password, &stored_hash) {
        return Err(AppError::bad_request("invalid username or password"));
    }

    auth_db::update_last_login(&conn, user_id).log_warn("failed to update last login");

    let token = generate_token();
    auth_db::create_session(
        &conn,
        user_id,
        &password::token_digest(&token),
        config::SESSION_DURATION_HOURS,
    )?;

    let info = auth_db::get_user_by_id(&conn, user_id)?
        .ok_or_else(|| AppError::Internal("user row missing".to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: profile_from(info),
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<Value>, AppError> {
    if let Some(token) = super::middleware::bearer_token(&headers) {
        let conn = db::try_lock(&state.db)?;
        auth_db::delete_session(&conn, &password::token_digest(token))?;
    }
    Ok(Json(json!({ "ok": true })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let conn = db::try_lock(&state.db)?;
    let info = auth_db::get_user_by_id(&conn, auth.user_id)?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    Ok(Json(profile_from(info)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(is_valid_username("abc"));
        assert!(is_valid_username("user123"));
        assert!(is_valid_username("my_user"));
        assert!(is_valid_username("a".repeat(32).as_str()));
    }

    #[test]
    fn test_invalid_usernames() {
        assert!(!is_valid_username("ab")); // too short
        assert!(!is_valid_username(&"a".repeat(33))); // too long
        assert!(!is_valid_username("user name")); // space
        assert!(!is_valid_username("user-name")); // hyphen
        assert!(!is_valid_username("")); // empty
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@nodot"));
    }

    #[test]
    fn test_generated_tokens_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), crate::config::SESSION_TOKEN_LEN);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
