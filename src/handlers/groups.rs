//! Study group handlers: membership and message board.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::config;
use crate::db::{self, groups};
use crate::domain::{GroupMessage, StudyGroup};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub subject: String,
}

#[derive(Serialize)]
pub struct GroupListItem {
    #[serde(flatten)]
    pub group: StudyGroup,
    pub member_count: i64,
    pub is_member: bool,
}

#[derive(Serialize)]
pub struct GroupMember {
    pub user_id: i64,
    pub username: String,
    pub joined_at: String,
}

#[derive(Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: StudyGroup,
    pub members: Vec<GroupMember>,
}

#[derive(Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
}

/// POST /api/study-groups
pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<GroupDetail>, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() || name.len() > 100 {
        return Err(AppError::bad_request("name must be 1-100 characters"));
    }
    let subject = req.subject.trim().to_string();
    if subject.is_empty() || subject.len() > 200 {
        return Err(AppError::bad_request("subject must be 1-200 characters"));
    }

    let conn = db::try_lock(&state.db)?;
    let group_id = groups::create_group(
        &conn,
        auth.user_id,
        &name,
        req.description.as_deref(),
        &subject,
    )?;
    tracing::info!("user {} created group {} ({})", auth.user_id, group_id, name);

    group_detail(&conn, group_id).map(Json)
}

fn group_detail(conn: &rusqlite::Connection, group_id: i64) -> Result<GroupDetail, AppError> {
    let group = groups::get_group(conn, group_id)?
        .ok_or_else(|| AppError::not_found("group not found"))?;
    let members = groups::get_members(conn, group_id)?
        .into_iter()
        .map(|(user_id, username, joined_at)| GroupMember {
            user_id,
            username,
            joined_at,
        })
        .collect();
    Ok(GroupDetail { group, members })
}

/// GET /api/study-groups
pub async fn list_groups(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<GroupListItem>>, AppError> {
    let conn = db::try_lock(&state.db)?;
    let items = groups::list_groups(&conn, auth.user_id)?
        .into_iter()
        .map(|s| GroupListItem {
            group: s.group,
            member_count: s.member_count,
            is_member: s.is_member,
        })
        .collect();
    Ok(Json(items))
}

/// GET /api/study-groups/{id}
pub async fn get_group(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupDetail>, AppError> {
    let conn = db::try_lock(&state.db)?;
    group_detail(&conn, group_id).map(Json)
}

/// POST /api/study-groups/{id}/join
pub async fn join_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = db::try_lock(&state.db)?;
    groups::get_group(&conn, group_id)?.ok_or_else(|| AppError::not_found("group not found"))?;
    groups::join_group(&conn, group_id, auth.user_id)?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/study-groups/{id}/leave
pub async fn leave_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = db::try_lock(&state.db)?;
    let group = groups::get_group(&conn, group_id)?
        .ok_or_else(|| AppError::not_found("group not found"))?;
    if group.owner_id == auth.user_id {
        return Err(AppError::bad_request(
            "the owner cannot leave; delete the group instead",
        ));
    }
    groups::leave_group(&conn, group_id, auth.user_id)?;
    Ok(Json(json!({ "ok": true })))
}

/// DELETE /api/study-groups/{id}
pub async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = db::try_lock(&state.db)?;
    let group = groups::get_group(&conn, group_id)?
        .ok_or_else(|| AppError::not_found("group not found"))?;
    if group.owner_id != auth.user_id {
        return Err(AppError::Forbidden(
            "only the owner can delete a group".to_string(),
        ));
    }
    groups::delete_group(&conn, group_id, auth.user_id)?;
    Ok(Json(json!({ "ok": true })))
}

/// Resolve a group and require the caller to be a member
fn require_member(
    conn: &rusqlite::Connection,
    group_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    groups::get_group(conn, group_id)?.ok_or_else(|| AppError::not_found("group not found"))?;
    if !groups::is_member(conn, group_id, user_id)? {
        return Err(AppError::Forbidden("not a group member".to_string()));
    }
    Ok(())
}

/// GET /api/study-groups/{id}/messages?limit=
pub async fn get_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<i64>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<GroupMessage>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(config::DEFAULT_MESSAGE_LIMIT)
        .clamp(1, 200);

    let conn = db::try_lock(&state.db)?;
    require_member(&conn, group_id, auth.user_id)?;
    Ok(Json(groups::get_messages(&conn, group_id, limit)?))
}

/// POST /api/study-groups/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<i64>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(AppError::bad_request("message body must not be empty"));
    }
    if body.len() > config::MAX_MESSAGE_LEN {
        return Err(AppError::bad_request(format!(
            "message body must be at most {} characters",
            config::MAX_MESSAGE_LEN
        )));
    }

    let conn = db::try_lock(&state.db)?;
    require_member(&conn, group_id, auth.user_id)?;
    let message_id = groups::post_message(&conn, group_id, auth.user_id, body)?;
    Ok(Json(json!({ "id": message_id })))
}
