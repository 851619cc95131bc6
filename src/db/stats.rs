//! Progress statistics across plans and quizzes.

use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Aggregated progress for a user
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub total_plans: i64,
    pub total_plan_days: i64,
    pub completed_plan_days: i64,
    pub total_quizzes: i64,
    pub total_attempts: i64,
    pub average_score_percent: f64,
    pub streak_days: i64,
}

/// Plan day totals: (total, completed)
pub fn plan_day_totals(conn: &Connection, user_id: i64) -> Result<(i64, i64)> {
    conn.query_row(
        r#"SELECT COUNT(*), COUNT(d.completed_at)
           FROM plan_days d
           JOIN study_plans p ON p.id = d.plan_id
           WHERE p.user_id = ?1"#,
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}

/// Quiz attempt totals: (attempt count, average score percent)
pub fn attempt_totals(conn: &Connection, user_id: i64) -> Result<(i64, f64)> {
    conn.query_row(
        r#"SELECT COUNT(*),
                  COALESCE(AVG(CASE WHEN total > 0 THEN score * 100.0 / total END), 0.0)
           FROM quiz_attempts WHERE user_id = ?1"#,
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}

/// Distinct calendar dates (UTC) on which the user completed a plan day or
/// finished a quiz attempt
fn activity_dates(conn: &Connection, user_id: i64) -> Result<HashSet<NaiveDate>> {
    let mut dates = HashSet::new();

    let mut stmt = conn.prepare(
        r#"SELECT DISTINCT DATE(d.completed_at)
           FROM plan_days d
           JOIN study_plans p ON p.id = d.plan_id
           WHERE p.user_id = ?1 AND d.completed_at IS NOT NULL
           UNION
           SELECT DISTINCT DATE(completed_at)
           FROM quiz_attempts WHERE user_id = ?1"#,
    )?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;
    for row in rows {
        if let Ok(date) = NaiveDate::parse_from_str(&row?, "%Y-%m-%d") {
            dates.insert(date);
        }
    }
    Ok(dates)
}

/// Consecutive calendar days of activity, anchored at today (or yesterday
/// when today has no activity yet)
pub fn study_streak(conn: &Connection, user_id: i64) -> Result<i64> {
    let dates = activity_dates(conn, user_id)?;
    let today = Utc::now().date_naive();

    let mut cursor = if dates.contains(&today) {
        today
    } else if dates.contains(&(today - Duration::days(1))) {
        today - Duration::days(1)
    } else {
        return Ok(0);
    };

    let mut streak = 0;
    while dates.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    Ok(streak)
}

/// Build the full progress summary for a user
pub fn progress_summary(conn: &Connection, user_id: i64) -> Result<ProgressSummary> {
    let total_plans: i64 = conn.query_row(
        "SELECT COUNT(*) FROM study_plans WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    let total_quizzes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM quizzes WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    let (total_plan_days, completed_plan_days) = plan_day_totals(conn, user_id)?;
    let (total_attempts, average_score_percent) = attempt_totals(conn, user_id)?;
    let streak_days = study_streak(conn, user_id)?;

    Ok(ProgressSummary {
        total_plans,
        total_plan_days,
        completed_plan_days,
        total_quizzes,
        total_attempts,
        average_score_percent,
        streak_days,
    })
}
