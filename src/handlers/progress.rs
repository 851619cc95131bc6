//! Aggregated progress view.

use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::db::{self, stats};
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/study/progress
pub async fn get_progress(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<stats::ProgressSummary>, AppError> {
    let conn = db::try_lock(&state.db)?;
    Ok(Json(stats::progress_summary(&conn, auth.user_id)?))
}
