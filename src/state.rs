//! Application state passed to all handlers.

use std::sync::Arc;

use crate::ai::AiService;
use crate::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    /// Shared database (users, plans, quizzes, groups, conversations)
    pub db: DbPool,

    /// AI provider chain with structured fallback
    pub ai: Arc<AiService>,
}

impl AppState {
    pub fn new(db: DbPool, ai: Arc<AiService>) -> Self {
        Self { db, ai }
    }
}
