//! Quiz handlers: generation, taking, grading.
//!
//! List and detail views hide `correct_index` and `explanation` so a quiz
//! can be taken without the answers in hand; grading responses reveal them.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::config;
use crate::db::{self, quizzes};
use crate::domain::{Quiz, QuizAttempt, QuizQuestion};
use crate::error::AppError;
use crate::state::AppState;

use super::plans::parse_difficulty;

#[derive(Deserialize)]
pub struct CreateQuizRequest {
    pub topic: String,
    pub question_count: i64,
    pub difficulty: Option<String>,
}

/// Question as shown while taking the quiz (no answer key)
#[derive(Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub position: i64,
    pub prompt: String,
    pub options: Vec<String>,
}

impl From<QuizQuestion> for QuestionView {
    fn from(q: QuizQuestion) -> Self {
        Self {
            id: q.id,
            position: q.position,
            prompt: q.prompt,
            options: q.options,
        }
    }
}

#[derive(Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuestionView>,
}

#[derive(Deserialize)]
pub struct AttemptRequest {
    pub answers: Vec<i64>,
}

/// Per-question grading outcome, answer key included
#[derive(Serialize)]
pub struct QuestionResult {
    pub position: i64,
    pub correct: bool,
    pub correct_index: i64,
    pub explanation: String,
}

#[derive(Serialize)]
pub struct AttemptResponse {
    pub attempt_id: i64,
    pub score: i64,
    pub total: i64,
    pub results: Vec<QuestionResult>,
}

/// POST /api/study/quizzes
pub async fn create_quiz(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateQuizRequest>,
) -> Result<Json<QuizDetail>, AppError> {
    let topic = req.topic.trim().to_string();
    if topic.is_empty() || topic.len() > 200 {
        return Err(AppError::bad_request("topic must be 1-200 characters"));
    }
    if !(1..=config::MAX_QUIZ_QUESTIONS).contains(&req.question_count) {
        return Err(AppError::bad_request(format!(
            "question_count must be between 1 and {}",
            config::MAX_QUIZ_QUESTIONS
        )));
    }
    let difficulty = parse_difficulty(&req.difficulty)?;

    // The database lock must not be held across the provider calls
    let (generated, source) = state
        .ai
        .generate_quiz(&topic, req.question_count, difficulty)
        .await;

    let conn = db::try_lock(&state.db)?;
    let quiz_id = quizzes::insert_quiz(&conn, auth.user_id, difficulty, &source, &generated)?;
    tracing::info!(
        "created quiz {} for user {} ({} questions, source {})",
        quiz_id,
        auth.user_id,
        req.question_count,
        source
    );

    let quiz = quizzes::get_quiz(&conn, auth.user_id, quiz_id)?
        .ok_or_else(|| AppError::Internal("quiz vanished after insert".to_string()))?;
    let questions = quizzes::get_questions(&conn, quiz_id)?;

    Ok(Json(QuizDetail {
        quiz,
        questions: questions.into_iter().map(QuestionView::from).collect(),
    }))
}

/// GET /api/study/quizzes
pub async fn list_quizzes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Quiz>>, AppError> {
    let conn = db::try_lock(&state.db)?;
    Ok(Json(quizzes::list_quizzes(&conn, auth.user_id)?))
}

/// GET /api/study/quizzes/{id}
pub async fn get_quiz(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quiz_id): Path<i64>,
) -> Result<Json<QuizDetail>, AppError> {
    let conn = db::try_lock(&state.db)?;
    let quiz = quizzes::get_quiz(&conn, auth.user_id, quiz_id)?
        .ok_or_else(|| AppError::not_found("quiz not found"))?;
    let questions = quizzes::get_questions(&conn, quiz_id)?;
    Ok(Json(QuizDetail {
        quiz,
        questions: questions.into_iter().map(QuestionView::from).collect(),
    }))
}

/// POST /api/study/quizzes/{id}/attempts
pub async fn submit_attempt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quiz_id): Path<i64>,
    Json(req): Json<AttemptRequest>,
) -> Result<Json<AttemptResponse>, AppError> {
    let conn = db::try_lock(&state.db)?;
    quizzes::get_quiz(&conn, auth.user_id, quiz_id)?
        .ok_or_else(|| AppError::not_found("quiz not found"))?;
    let questions = quizzes::get_questions(&conn, quiz_id)?;

    let (score, correctness) =
        quizzes::grade_answers(&questions, &req.answers).ok_or_else(|| {
            AppError::bad_request(format!(
                "expected {} answers, got {}",
                questions.len(),
                req.answers.len()
            ))
        })?;
    let total = questions.len() as i64;

    let attempt_id =
        quizzes::insert_attempt(&conn, quiz_id, auth.user_id, &req.answers, score, total)?;

    let results = questions
        .into_iter()
        .zip(correctness)
        .map(|(q, correct)| QuestionResult {
            position: q.position,
            correct,
            correct_index: q.correct_index,
            explanation: q.explanation,
        })
        .collect();

    Ok(Json(AttemptResponse {
        attempt_id,
        score,
        total,
        results,
    }))
}

/// GET /api/study/quizzes/{id}/attempts
pub async fn list_attempts(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quiz_id): Path<i64>,
) -> Result<Json<Vec<QuizAttempt>>, AppError> {
    let conn = db::try_lock(&state.db)?;
    quizzes::get_quiz(&conn, auth.user_id, quiz_id)?
        .ok_or_else(|| AppError::not_found("quiz not found"))?;
    Ok(Json(quizzes::list_attempts(&conn, quiz_id, auth.user_id)?))
}

/// DELETE /api/study/quizzes/{id}
pub async fn delete_quiz(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quiz_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = db::try_lock(&state.db)?;
    if !quizzes::delete_quiz(&conn, auth.user_id, quiz_id)? {
        return Err(AppError::not_found("quiz not found"));
    }
    Ok(Json(json!({ "ok": true })))
}
