//! Quiz persistence and grading (quizzes, quiz_questions, quiz_attempts).

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};

use super::{parse_i64_vec, parse_string_vec, parse_ts};
use crate::ai::GeneratedQuiz;
use crate::domain::{Difficulty, Quiz, QuizAttempt, QuizQuestion};

/// Persist a generated quiz and its questions, returns the quiz ID
pub fn insert_quiz(
    conn: &Connection,
    user_id: i64,
    difficulty: Difficulty,
    source: &str,
    generated: &GeneratedQuiz,
) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO quizzes (user_id, topic, difficulty, source, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, generated.topic, difficulty.as_str(), source, now],
    )?;
    let quiz_id = conn.last_insert_rowid();

    for (position, q) in generated.questions.iter().enumerate() {
        let options = serde_json::to_string(&q.options).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            r#"INSERT INTO quiz_questions
               (quiz_id, position, prompt, options, correct_index, explanation)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                quiz_id,
                position as i64,
                q.prompt,
                options,
                q.correct_index,
                q.explanation
            ],
        )?;
    }

    Ok(quiz_id)
}

fn row_to_quiz(row: &rusqlite::Row<'_>) -> rusqlite::Result<Quiz> {
    let difficulty: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    Ok(Quiz {
        id: row.get(0)?,
        user_id: row.get(1)?,
        topic: row.get(2)?,
        difficulty: Difficulty::from_str(&difficulty).unwrap_or_default(),
        source: row.get(4)?,
        created_at: parse_ts(&created_at)?,
    })
}

/// Get a quiz owned by the given user
pub fn get_quiz(conn: &Connection, user_id: i64, quiz_id: i64) -> Result<Option<Quiz>> {
    conn.query_row(
        r#"SELECT id, user_id, topic, difficulty, source, created_at
           FROM quizzes WHERE id = ?1 AND user_id = ?2"#,
        params![quiz_id, user_id],
        row_to_quiz,
    )
    .optional()
}

/// List a user's quizzes, newest first
pub fn list_quizzes(conn: &Connection, user_id: i64) -> Result<Vec<Quiz>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, user_id, topic, difficulty, source, created_at
           FROM quizzes WHERE user_id = ?1 ORDER BY created_at DESC"#,
    )?;
    let quizzes = stmt
        .query_map(params![user_id], row_to_quiz)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(quizzes)
}

/// Get a quiz's questions in position order
pub fn get_questions(conn: &Connection, quiz_id: i64) -> Result<Vec<QuizQuestion>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, quiz_id, position, prompt, options, correct_index, explanation
           FROM quiz_questions WHERE quiz_id = ?1 ORDER BY position"#,
    )?;
    let questions = stmt
        .query_map(params![quiz_id], |row| {
            let options: String = row.get(4)?;
            Ok(QuizQuestion {
                id: row.get(0)?,
                quiz_id: row.get(1)?,
                position: row.get(2)?,
                prompt: row.get(3)?,
                options: parse_string_vec(&options),
                correct_index: row.get(5)?,
                explanation: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(questions)
}

/// Grade an answer vector against the quiz's questions.
/// Returns (score, per-question correctness) or None when the answer count
/// does not match the question count.
pub fn grade_answers(questions: &[QuizQuestion], answers: &[i64]) -> Option<(i64, Vec<bool>)> {
    if questions.len() != answers.len() {
        return None;
    }
    let results: Vec<bool> = questions
        .iter()
        .zip(answers)
        .map(|(q, &a)| a == q.correct_index)
        .collect();
    let score = results.iter().filter(|&&c| c).count() as i64;
    Some((score, results))
}

/// Store a graded attempt, returns the attempt ID
pub fn insert_attempt(
    conn: &Connection,
    quiz_id: i64,
    user_id: i64,
    answers: &[i64],
    score: i64,
    total: i64,
) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    let answers_json = serde_json::to_string(answers).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        r#"INSERT INTO quiz_attempts (quiz_id, user_id, answers, score, total, completed_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        params![quiz_id, user_id, answers_json, score, total, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List a user's attempts at a quiz, newest first
pub fn list_attempts(conn: &Connection, quiz_id: i64, user_id: i64) -> Result<Vec<QuizAttempt>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, quiz_id, user_id, answers, score, total, completed_at
           FROM quiz_attempts
           WHERE quiz_id = ?1 AND user_id = ?2
           ORDER BY completed_at DESC, id DESC"#,
    )?;
    let attempts = stmt
        .query_map(params![quiz_id, user_id], |row| {
            let answers: String = row.get(3)?;
            let completed_at: String = row.get(6)?;
            Ok(QuizAttempt {
                id: row.get(0)?,
                quiz_id: row.get(1)?,
                user_id: row.get(2)?,
                answers: parse_i64_vec(&answers),
                score: row.get(4)?,
                total: row.get(5)?,
                completed_at: parse_ts(&completed_at)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(attempts)
}

/// Delete a quiz and its questions/attempts (cascade)
pub fn delete_quiz(conn: &Connection, user_id: i64, quiz_id: i64) -> Result<bool> {
    let count = conn.execute(
        "DELETE FROM quizzes WHERE id = ?1 AND user_id = ?2",
        params![quiz_id, user_id],
    )?;
    Ok(count > 0)
}
