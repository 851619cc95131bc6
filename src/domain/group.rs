use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A study group users can join to discuss a subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub subject: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A message posted to a group's discussion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessage {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
