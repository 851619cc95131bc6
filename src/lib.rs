pub mod ai;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod testing;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::handlers as auth_handlers;
use crate::handlers::{chat, groups, plans, progress, quizzes, sessions};
use crate::state::AppState;

/// Build the full API router
pub fn app(state: AppState) -> Router {
    Router::new()
        // auth
        .route("/api/auth/register", post(auth_handlers::register))
        .route("/api/auth/login", post(auth_handlers::login))
        .route("/api/auth/logout", post(auth_handlers::logout))
        .route("/api/auth/me", get(auth_handlers::me))
        // study plans
        .route("/api/study/plans", post(plans::create_plan).get(plans::list_plans))
        .route(
            "/api/study/plans/{id}",
            get(plans::get_plan).delete(plans::delete_plan),
        )
        .route(
            "/api/study/plans/{id}/days/{day}/complete",
            post(plans::complete_day),
        )
        .route(
            "/api/study/plans/{id}/days/{day}/uncomplete",
            post(plans::uncomplete_day),
        )
        .route("/api/study/progress", get(progress::get_progress))
        // timed study sessions
        .route("/api/study/sessions/start", post(sessions::start_session))
        .route("/api/study/sessions/current", get(sessions::current_session))
        .route("/api/study/sessions/finish", post(sessions::finish_session))
        // quizzes
        .route(
            "/api/study/quizzes",
            post(quizzes::create_quiz).get(quizzes::list_quizzes),
        )
        .route(
            "/api/study/quizzes/{id}",
            get(quizzes::get_quiz).delete(quizzes::delete_quiz),
        )
        .route(
            "/api/study/quizzes/{id}/attempts",
            post(quizzes::submit_attempt).get(quizzes::list_attempts),
        )
        // study groups
        .route(
            "/api/study-groups",
            post(groups::create_group).get(groups::list_groups),
        )
        .route(
            "/api/study-groups/{id}",
            get(groups::get_group).delete(groups::delete_group),
        )
        .route("/api/study-groups/{id}/join", post(groups::join_group))
        .route("/api/study-groups/{id}/leave", post(groups::leave_group))
        .route(
            "/api/study-groups/{id}/messages",
            get(groups::get_messages).post(groups::post_message),
        )
        // AI chat
        .route("/api/ai/chat", post(chat::chat))
        .route("/api/ai/conversations", get(chat::list_conversations))
        .route(
            "/api/ai/conversations/{id}",
            get(chat::get_conversation).delete(chat::delete_conversation),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Route not in the table above
async fn not_found() -> error::AppError {
    error::AppError::not_found("no such endpoint")
}
