//! AI chat handlers.
//!
//! A chat turn appends the user message, asks the provider chain for a
//! reply (falling back to templated advice), and appends the reply. The
//! whole exchange is persisted so history carries across requests.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::config;
use crate::db::{self, conversations};
use crate::domain::{ChatRole, Conversation, ConversationMessage};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<i64>,
    pub subject: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub conversation_id: i64,
    pub reply: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<ConversationMessage>,
}

/// POST /api/ai/chat
pub async fn chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }
    if message.len() > config::MAX_MESSAGE_LEN {
        return Err(AppError::bad_request(format!(
            "message must be at most {} characters",
            config::MAX_MESSAGE_LEN
        )));
    }

    // Load or create the conversation and record the user turn, then release
    // the lock before calling out to the providers
    let (conversation_id, subject, history) = {
        let conn = db::try_lock(&state.db)?;

        let (conversation_id, subject) = match req.conversation_id {
            Some(id) => {
                let conversation = conversations::get_conversation(&conn, auth.user_id, id)?
                    .ok_or_else(|| AppError::not_found("conversation not found"))?;
                (id, conversation.subject)
            }
            None => {
                let subject = req
                    .subject
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from);
                let id = conversations::create_conversation(&conn, auth.user_id, subject.as_deref())?;
                (id, subject)
            }
        };

        let history: Vec<(ChatRole, String)> = conversations::get_messages(&conn, conversation_id)?
            .into_iter()
            .map(|m| (m.role, m.body))
            .collect();

        conversations::append_message(&conn, conversation_id, ChatRole::User, &message)?;
        (conversation_id, subject, history)
    };

    let (reply, source) = state.ai.chat(&history, &message, subject.as_deref()).await;

    let conn = db::try_lock(&state.db)?;
    conversations::append_message(&conn, conversation_id, ChatRole::Assistant, &reply)?;

    Ok(Json(ChatResponse {
        conversation_id,
        reply,
        source,
    }))
}

/// GET /api/ai/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let conn = db::try_lock(&state.db)?;
    Ok(Json(conversations::list_conversations(&conn, auth.user_id)?))
}

/// GET /api/ai/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<i64>,
) -> Result<Json<ConversationDetail>, AppError> {
    let conn = db::try_lock(&state.db)?;
    let conversation = conversations::get_conversation(&conn, auth.user_id, conversation_id)?
        .ok_or_else(|| AppError::not_found("conversation not found"))?;
    let messages = conversations::get_messages(&conn, conversation_id)?;
    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

/// DELETE /api/ai/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = db::try_lock(&state.db)?;
    if !conversations::delete_conversation(&conn, auth.user_id, conversation_id)? {
        return Err(AppError::not_found("conversation not found"));
    }
    Ok(Json(json!({ "ok": true })))
}
