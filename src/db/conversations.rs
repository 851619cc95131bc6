//! AI conversation persistence (ai_conversations, conversation_messages).

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};

use super::parse_ts;
use crate::domain::{ChatRole, Conversation, ConversationMessage};

/// Create a conversation, returns its ID
pub fn create_conversation(conn: &Connection, user_id: i64, subject: Option<&str>) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        r#"INSERT INTO ai_conversations (user_id, subject, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4)"#,
        params![user_id, subject, now, now],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    Ok(Conversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subject: row.get(2)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

/// Get a conversation owned by the given user
pub fn get_conversation(
    conn: &Connection,
    user_id: i64,
    conversation_id: i64,
) -> Result<Option<Conversation>> {
    conn.query_row(
        r#"SELECT id, user_id, subject, created_at, updated_at
           FROM ai_conversations WHERE id = ?1 AND user_id = ?2"#,
        params![conversation_id, user_id],
        row_to_conversation,
    )
    .optional()
}

/// List a user's conversations, most recently active first
pub fn list_conversations(conn: &Connection, user_id: i64) -> Result<Vec<Conversation>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, user_id, subject, created_at, updated_at
           FROM ai_conversations WHERE user_id = ?1 ORDER BY updated_at DESC"#,
    )?;
    let conversations = stmt
        .query_map(params![user_id], row_to_conversation)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(conversations)
}

/// Append a turn and bump the conversation's updated_at
pub fn append_message(
    conn: &Connection,
    conversation_id: i64,
    role: ChatRole,
    body: &str,
) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        r#"INSERT INTO conversation_messages (conversation_id, role, body, created_at)
           VALUES (?1, ?2, ?3, ?4)"#,
        params![conversation_id, role.as_str(), body, now],
    )?;
    let message_id = conn.last_insert_rowid();
    conn.execute(
        "UPDATE ai_conversations SET updated_at = ?1 WHERE id = ?2",
        params![now, conversation_id],
    )?;
    Ok(message_id)
}

/// Get a conversation's messages in order
pub fn get_messages(conn: &Connection, conversation_id: i64) -> Result<Vec<ConversationMessage>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, conversation_id, role, body, created_at
           FROM conversation_messages WHERE conversation_id = ?1 ORDER BY id"#,
    )?;
    let messages = stmt
        .query_map(params![conversation_id], |row| {
            let role: String = row.get(2)?;
            let created_at: String = row.get(4)?;
            Ok(ConversationMessage {
                id: row.get(0)?,
                conversation_id: row.get(1)?,
                role: ChatRole::from_str(&role).unwrap_or(ChatRole::User),
                body: row.get(3)?,
                created_at: parse_ts(&created_at)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(messages)
}

/// Delete a conversation and its messages (cascade)
pub fn delete_conversation(conn: &Connection, user_id: i64, conversation_id: i64) -> Result<bool> {
    let count = conn.execute(
        "DELETE FROM ai_conversations WHERE id = ?1 AND user_id = ?2",
        params![conversation_id, user_id],
    )?;
    Ok(count > 0)
}
