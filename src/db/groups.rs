//! Study group persistence (study_groups, group_members, group_messages).

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};

use super::parse_ts;
use crate::domain::{GroupMessage, StudyGroup};

/// A group row plus membership info, for list views
#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub group: StudyGroup,
    pub member_count: i64,
    pub is_member: bool,
}

/// Create a group; the owner is added as its first member
pub fn create_group(
    conn: &Connection,
    owner_id: i64,
    name: &str,
    description: Option<&str>,
    subject: &str,
) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        r#"INSERT INTO study_groups (name, description, subject, owner_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)"#,
        params![name, description, subject, owner_id, now],
    )?;
    let group_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO group_members (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
        params![group_id, owner_id, now],
    )?;
    Ok(group_id)
}

fn row_to_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<StudyGroup> {
    let created_at: String = row.get(5)?;
    Ok(StudyGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        subject: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: parse_ts(&created_at)?,
    })
}

/// Get a group by ID
pub fn get_group(conn: &Connection, group_id: i64) -> Result<Option<StudyGroup>> {
    conn.query_row(
        r#"SELECT id, name, description, subject, owner_id, created_at
           FROM study_groups WHERE id = ?1"#,
        params![group_id],
        row_to_group,
    )
    .optional()
}

/// List all groups with member counts and the caller's membership flag
pub fn list_groups(conn: &Connection, user_id: i64) -> Result<Vec<GroupSummary>> {
    let mut stmt = conn.prepare(
        r#"SELECT g.id, g.name, g.description, g.subject, g.owner_id, g.created_at,
                  (SELECT COUNT(*) FROM group_members m WHERE m.group_id = g.id),
                  EXISTS (SELECT 1 FROM group_members m
                           WHERE m.group_id = g.id AND m.user_id = ?1)
           FROM study_groups g
           ORDER BY g.created_at DESC"#,
    )?;
    let groups = stmt
        .query_map(params![user_id], |row| {
            Ok(GroupSummary {
                group: row_to_group(row)?,
                member_count: row.get(6)?,
                is_member: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(groups)
}

/// Get a group's members as (user_id, username, joined_at) rows
pub fn get_members(conn: &Connection, group_id: i64) -> Result<Vec<(i64, String, String)>> {
    let mut stmt = conn.prepare(
        r#"SELECT u.id, u.username, m.joined_at
           FROM group_members m
           JOIN users u ON u.id = m.user_id
           WHERE m.group_id = ?1
           ORDER BY m.joined_at"#,
    )?;
    let members = stmt
        .query_map(params![group_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(members)
}

/// Check membership
pub fn is_member(conn: &Connection, group_id: i64, user_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM group_members WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Add a user to a group (idempotent)
pub fn join_group(conn: &Connection, group_id: i64, user_id: i64) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR IGNORE INTO group_members (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
        params![group_id, user_id, now],
    )?;
    Ok(())
}

/// Remove a user from a group
pub fn leave_group(conn: &Connection, group_id: i64, user_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
    )?;
    Ok(())
}

/// Delete a group and its members/messages (cascade). Owner only.
pub fn delete_group(conn: &Connection, group_id: i64, owner_id: i64) -> Result<bool> {
    let count = conn.execute(
        "DELETE FROM study_groups WHERE id = ?1 AND owner_id = ?2",
        params![group_id, owner_id],
    )?;
    Ok(count > 0)
}

/// Post a message to a group, returns the message ID
pub fn post_message(conn: &Connection, group_id: i64, user_id: i64, body: &str) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO group_messages (group_id, user_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![group_id, user_id, body, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get the most recent `limit` messages, oldest first
pub fn get_messages(conn: &Connection, group_id: i64, limit: i64) -> Result<Vec<GroupMessage>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, group_id, user_id, username, body, created_at
           FROM (
               SELECT msg.id, msg.group_id, msg.user_id, u.username, msg.body, msg.created_at
               FROM group_messages msg
               JOIN users u ON u.id = msg.user_id
               WHERE msg.group_id = ?1
               ORDER BY msg.id DESC
               LIMIT ?2
           )
           ORDER BY id"#,
    )?;
    let messages = stmt
        .query_map(params![group_id, limit], |row| {
            let created_at: String = row.get(5)?;
            Ok(GroupMessage {
                id: row.get(0)?,
                group_id: row.get(1)?,
                user_id: row.get(2)?,
                username: row.get(3)?,
                body: row.get(4)?,
                created_at: parse_ts(&created_at)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;

    #[test]
    fn test_create_group_owner_is_member() {
        let env = TestEnv::new().unwrap();
        let alice = env.create_user("alice");
        let group_id =
            create_group(&env.conn, alice, "Calc Crew", Some("limits and rates"), "Calculus")
                .unwrap();

        assert!(is_member(&env.conn, group_id, alice).unwrap());
        let groups = list_groups(&env.conn, alice).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].member_count, 1);
        assert!(groups[0].is_member);
    }

    #[test]
    fn test_join_is_idempotent() {
        let env = TestEnv::new().unwrap();
        let alice = env.create_user("alice");
        let bob = env.create_user("bob");
        let group_id = create_group(&env.conn, alice, "Crew", None, "Physics").unwrap();

        join_group(&env.conn, group_id, bob).unwrap();
        join_group(&env.conn, group_id, bob).unwrap();

        assert_eq!(get_members(&env.conn, group_id).unwrap().len(), 2);
    }

    #[test]
    fn test_leave_and_delete() {
        let env = TestEnv::new().unwrap();
        let alice = env.create_user("alice");
        let bob = env.create_user("bob");
        let group_id = create_group(&env.conn, alice, "Crew", None, "Physics").unwrap();
        join_group(&env.conn, group_id, bob).unwrap();

        leave_group(&env.conn, group_id, bob).unwrap();
        assert!(!is_member(&env.conn, group_id, bob).unwrap());

        // Only the owner can delete
        assert!(!delete_group(&env.conn, group_id, bob).unwrap());
        assert!(delete_group(&env.conn, group_id, alice).unwrap());
        assert!(get_group(&env.conn, group_id).unwrap().is_none());
    }

    #[test]
    fn test_message_ordering_and_limit() {
        let env = TestEnv::new().unwrap();
        let alice = env.create_user("alice");
        let group_id = create_group(&env.conn, alice, "Crew", None, "Physics").unwrap();

        for i in 0..5 {
            post_message(&env.conn, group_id, alice, &format!("message {}", i)).unwrap();
        }

        // Most recent 3, oldest first
        let messages = get_messages(&env.conn, group_id, 3).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].body, "message 2");
        assert_eq!(messages[2].body, "message 4");
        assert_eq!(messages[0].username, "alice");
    }
}
