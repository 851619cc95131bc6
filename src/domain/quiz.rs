use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Difficulty;

/// A generated multiple-choice quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub user_id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    /// Where the content came from: "provider:<name>" or "fallback"
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// A four-option multiple-choice question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub quiz_id: i64,
    /// Zero-based order within the quiz
    pub position: i64,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: i64,
    pub explanation: String,
}

/// A graded attempt at a quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    /// Selected option index per question, in question order
    pub answers: Vec<i64>,
    pub score: i64,
    pub total: i64,
    pub completed_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            self.score as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }
}
