use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Difficulty;

/// A generated study plan belonging to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub difficulty: Difficulty,
    pub duration_days: i64,
    pub hours_per_day: f64,
    pub overview: String,
    /// Where the content came from: "provider:<name>" or "fallback"
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// One day of plan content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDay {
    pub id: i64,
    pub plan_id: i64,
    pub day_number: i64,
    pub title: String,
    pub topics: Vec<String>,
    pub activities: Vec<String>,
    pub estimated_minutes: i64,
    pub completed_at: Option<DateTime<Utc>>,
}
