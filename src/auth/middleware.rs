//! Bearer-token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use super::db as auth_db;
use super::password::token_digest;
use crate::config;
use crate::db::LogOnError;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated request context.
/// Add this as a handler parameter to require authentication; requests
/// without a valid `Authorization: Bearer <token>` header get a 401.
#[derive(Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

/// Pull the bearer token out of the Authorization header
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let digest = token_digest(token);

        let conn = crate::db::try_lock(&state.db)?;

        // Sweep expired sessions occasionally (~10% of requests)
        if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
            if let Some(removed) =
                auth_db::cleanup_expired_sessions(&conn).log_warn("session cleanup failed")
            {
                if removed > 0 {
                    tracing::debug!("cleaned up {} expired sessions", removed);
                }
            }
        }

        let (user_id, username) = auth_db::get_session_user(&conn, &digest)?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser { user_id, username })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_auth(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert(header::AUTHORIZATION, v.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert_eq!(bearer_token(&headers_with_auth(None)), None);
        assert_eq!(bearer_token(&headers_with_auth(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&headers_with_auth(Some("Bearer "))), None);
    }
}
