//! Timed study session handlers.
//!
//! Sessions live in the in-memory store (`crate::session`), one per user.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::{self, plans};
use crate::error::AppError;
use crate::session::{self, StudySession};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartSessionRequest {
    pub plan_id: i64,
    pub day_number: i64,
}

#[derive(Deserialize, Default)]
pub struct FinishSessionRequest {
    #[serde(default)]
    pub mark_complete: bool,
}

#[derive(Serialize)]
pub struct FinishSessionResponse {
    pub plan_id: i64,
    pub day_number: i64,
    pub elapsed_minutes: i64,
    pub marked_complete: bool,
}

/// POST /api/study/sessions/start
pub async fn start_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<StudySession>, AppError> {
    {
        let conn = db::try_lock(&state.db)?;
        plans::get_plan(&conn, auth.user_id, req.plan_id)?
            .ok_or_else(|| AppError::not_found("plan not found"))?;
        if !plans::day_exists(&conn, req.plan_id, req.day_number)? {
            return Err(AppError::not_found("plan day not found"));
        }
    }

    let started = session::start_session(auth.user_id, req.plan_id, req.day_number);
    Ok(Json(started))
}

/// GET /api/study/sessions/current
pub async fn current_session(auth: AuthUser) -> Result<Json<StudySession>, AppError> {
    session::current_session(auth.user_id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("no active study session"))
}

/// POST /api/study/sessions/finish
pub async fn finish_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<FinishSessionRequest>,
) -> Result<Json<FinishSessionResponse>, AppError> {
    let finished = session::finish_session(auth.user_id)
        .ok_or_else(|| AppError::not_found("no active study session"))?;
    let elapsed_minutes = finished.elapsed_minutes(Utc::now());

    let mut marked_complete = false;
    if req.mark_complete {
        let conn = db::try_lock(&state.db)?;
        // The plan may have been deleted while the session ran
        if plans::get_plan(&conn, auth.user_id, finished.plan_id)?.is_some() {
            plans::complete_day(&conn, finished.plan_id, finished.day_number)?;
            marked_complete = true;
        }
    }

    Ok(Json(FinishSessionResponse {
        plan_id: finished.plan_id,
        day_number: finished.day_number,
        elapsed_minutes,
        marked_complete,
    }))
}
