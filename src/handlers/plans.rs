//! Study plan handlers: generation, listing, day completion.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::config;
use crate::db::{self, plans};
use crate::domain::{Difficulty, PlanDay, StudyPlan};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreatePlanRequest {
    pub subject: String,
    pub duration_days: i64,
    pub difficulty: Option<String>,
    pub hours_per_day: Option<f64>,
}

/// A plan together with its days
#[derive(Serialize)]
pub struct PlanDetail {
    #[serde(flatten)]
    pub plan: StudyPlan,
    pub days: Vec<PlanDay>,
}

/// A plan row with completion counts, for the list view
#[derive(Serialize)]
pub struct PlanListItem {
    #[serde(flatten)]
    pub plan: StudyPlan,
    pub total_days: i64,
    pub completed_days: i64,
}

pub(super) fn parse_difficulty(raw: &Option<String>) -> Result<Difficulty, AppError> {
    match raw {
        None => Ok(Difficulty::default()),
        Some(s) => Difficulty::from_str(s).ok_or_else(|| {
            AppError::bad_request("difficulty must be beginner, intermediate or advanced")
        }),
    }
}

/// POST /api/study/plans
pub async fn create_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePlanRequest>,
) -> Result<Json<PlanDetail>, AppError> {
    let subject = req.subject.trim().to_string();
    if subject.is_empty() || subject.len() > 200 {
        return Err(AppError::bad_request("subject must be 1-200 characters"));
    }
    if !(1..=config::MAX_PLAN_DURATION_DAYS).contains(&req.duration_days) {
        return Err(AppError::bad_request(format!(
            "duration_days must be between 1 and {}",
            config::MAX_PLAN_DURATION_DAYS
        )));
    }
    let difficulty = parse_difficulty(&req.difficulty)?;
    let hours_per_day = req.hours_per_day.unwrap_or(1.0);
    if !(hours_per_day > 0.0 && hours_per_day <= 16.0) {
        return Err(AppError::bad_request(
            "hours_per_day must be between 0 and 16",
        ));
    }

    // The database lock must not be held across the provider calls
    let (generated, source) = state
        .ai
        .generate_study_plan(&subject, req.duration_days, difficulty, hours_per_day)
        .await;

    let conn = db::try_lock(&state.db)?;
    let plan_id = plans::insert_plan(
        &conn,
        auth.user_id,
        difficulty,
        hours_per_day,
        &source,
        &generated,
    )?;
    tracing::info!(
        "created plan {} for user {} ({} days, source {})",
        plan_id,
        auth.user_id,
        req.duration_days,
        source
    );

    let plan = plans::get_plan(&conn, auth.user_id, plan_id)?
        .ok_or_else(|| AppError::Internal("plan vanished after insert".to_string()))?;
    let days = plans::get_plan_days(&conn, plan_id)?;

    Ok(Json(PlanDetail { plan, days }))
}

/// GET /api/study/plans
pub async fn list_plans(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PlanListItem>>, AppError> {
    let conn = db::try_lock(&state.db)?;
    let items = plans::list_plans(&conn, auth.user_id)?
        .into_iter()
        .map(|s| PlanListItem {
            plan: s.plan,
            total_days: s.total_days,
            completed_days: s.completed_days,
        })
        .collect();
    Ok(Json(items))
}

/// GET /api/study/plans/{id}
pub async fn get_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(plan_id): Path<i64>,
) -> Result<Json<PlanDetail>, AppError> {
    let conn = db::try_lock(&state.db)?;
    let plan = plans::get_plan(&conn, auth.user_id, plan_id)?
        .ok_or_else(|| AppError::not_found("plan not found"))?;
    let days = plans::get_plan_days(&conn, plan_id)?;
    Ok(Json(PlanDetail { plan, days }))
}

/// DELETE /api/study/plans/{id}
pub async fn delete_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(plan_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = db::try_lock(&state.db)?;
    if !plans::delete_plan(&conn, auth.user_id, plan_id)? {
        return Err(AppError::not_found("plan not found"));
    }
    Ok(Json(json!({ "ok": true })))
}

/// Resolve a (plan, day) pair owned by the caller, or 404
fn require_day(
    conn: &rusqlite::Connection,
    user_id: i64,
    plan_id: i64,
    day_number: i64,
) -> Result<(), AppError> {
    plans::get_plan(conn, user_id, plan_id)?.ok_or_else(|| AppError::not_found("plan not found"))?;
    if !plans::day_exists(conn, plan_id, day_number)? {
        return Err(AppError::not_found("plan day not found"));
    }
    Ok(())
}

/// POST /api/study/plans/{id}/days/{day}/complete
pub async fn complete_day(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((plan_id, day_number)): Path<(i64, i64)>,
) -> Result<Json<Value>, AppError> {
    let conn = db::try_lock(&state.db)?;
    require_day(&conn, auth.user_id, plan_id, day_number)?;
    plans::complete_day(&conn, plan_id, day_number)?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/study/plans/{id}/days/{day}/uncomplete
pub async fn uncomplete_day(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((plan_id, day_number)): Path<(i64, i64)>,
) -> Result<Json<Value>, AppError> {
    let conn = db::try_lock(&state.db)?;
    require_day(&conn, auth.user_id, plan_id, day_number)?;
    plans::uncomplete_day(&conn, plan_id, day_number)?;
    Ok(Json(json!({ "ok": true })))
}
