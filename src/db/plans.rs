//! Study plan persistence (study_plans, plan_days tables).

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};

use super::{parse_string_vec, parse_ts};
use crate::ai::GeneratedPlan;
use crate::domain::{Difficulty, PlanDay, StudyPlan};

/// A plan row plus its completion counts, for list views
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub plan: StudyPlan,
    pub total_days: i64,
    pub completed_days: i64,
}

/// Persist a generated plan and its days, returns the plan ID
pub fn insert_plan(
    conn: &Connection,
    user_id: i64,
    difficulty: Difficulty,
    hours_per_day: f64,
    source: &str,
    generated: &GeneratedPlan,
) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        r#"INSERT INTO study_plans
           (user_id, subject, difficulty, duration_days, hours_per_day, overview, source, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
        params![
            user_id,
            generated.subject,
            difficulty.as_str(),
            generated.days.len() as i64,
            hours_per_day,
            generated.overview,
            source,
            now
        ],
    )?;
    let plan_id = conn.last_insert_rowid();

    for day in &generated.days {
        let topics = serde_json::to_string(&day.topics).unwrap_or_else(|_| "[]".to_string());
        let activities =
            serde_json::to_string(&day.activities).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            r#"INSERT INTO plan_days
               (plan_id, day_number, title, topics, activities, estimated_minutes)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                plan_id,
                day.day,
                day.title,
                topics,
                activities,
                day.estimated_minutes
            ],
        )?;
    }

    Ok(plan_id)
}

fn row_to_plan(row: &rusqlite::Row<'_>) -> rusqlite::Result<StudyPlan> {
    let difficulty: String = row.get(3)?;
    let created_at: String = row.get(8)?;
    Ok(StudyPlan {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subject: row.get(2)?,
        difficulty: Difficulty::from_str(&difficulty).unwrap_or_default(),
        duration_days: row.get(4)?,
        hours_per_day: row.get(5)?,
        overview: row.get(6)?,
        source: row.get(7)?,
        created_at: parse_ts(&created_at)?,
    })
}

const PLAN_COLUMNS: &str =
    "id, user_id, subject, difficulty, duration_days, hours_per_day, overview, source, created_at";

/// Get a plan owned by the given user
pub fn get_plan(conn: &Connection, user_id: i64, plan_id: i64) -> Result<Option<StudyPlan>> {
    conn.query_row(
        &format!("SELECT {PLAN_COLUMNS} FROM study_plans WHERE id = ?1 AND user_id = ?2"),
        params![plan_id, user_id],
        row_to_plan,
    )
    .optional()
}

/// List a user's plans with completion counts, newest first
pub fn list_plans(conn: &Connection, user_id: i64) -> Result<Vec<PlanSummary>> {
    let mut stmt = conn.prepare(&format!(
        r#"SELECT {PLAN_COLUMNS},
                  (SELECT COUNT(*) FROM plan_days d WHERE d.plan_id = study_plans.id),
                  (SELECT COUNT(*) FROM plan_days d
                    WHERE d.plan_id = study_plans.id AND d.completed_at IS NOT NULL)
           FROM study_plans
           WHERE user_id = ?1
           ORDER BY created_at DESC"#
    ))?;
    let plans = stmt
        .query_map(params![user_id], |row| {
            Ok(PlanSummary {
                plan: row_to_plan(row)?,
                total_days: row.get(9)?,
                completed_days: row.get(10)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(plans)
}

/// Get all days of a plan in day order
pub fn get_plan_days(conn: &Connection, plan_id: i64) -> Result<Vec<PlanDay>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, plan_id, day_number, title, topics, activities, estimated_minutes, completed_at
           FROM plan_days
           WHERE plan_id = ?1
           ORDER BY day_number"#,
    )?;
    let days = stmt
        .query_map(params![plan_id], |row| {
            let topics: String = row.get(4)?;
            let activities: String = row.get(5)?;
            let completed_at: Option<String> = row.get(7)?;
            Ok(PlanDay {
                id: row.get(0)?,
                plan_id: row.get(1)?,
                day_number: row.get(2)?,
                title: row.get(3)?,
                topics: parse_string_vec(&topics),
                activities: parse_string_vec(&activities),
                estimated_minutes: row.get(6)?,
                completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(days)
}

/// Check whether a plan has a given day number
pub fn day_exists(conn: &Connection, plan_id: i64, day_number: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM plan_days WHERE plan_id = ?1 AND day_number = ?2",
        params![plan_id, day_number],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Mark a plan day complete. Idempotent: an already-complete day keeps its
/// original completion time.
pub fn complete_day(conn: &Connection, plan_id: i64, day_number: i64) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        r#"UPDATE plan_days SET completed_at = COALESCE(completed_at, ?1)
           WHERE plan_id = ?2 AND day_number = ?3"#,
        params![now, plan_id, day_number],
    )?;
    Ok(())
}

/// Clear a plan day's completion mark
pub fn uncomplete_day(conn: &Connection, plan_id: i64, day_number: i64) -> Result<()> {
    conn.execute(
        "UPDATE plan_days SET completed_at = NULL WHERE plan_id = ?1 AND day_number = ?2",
        params![plan_id, day_number],
    )?;
    Ok(())
}

/// Delete a plan and its days (cascade)
pub fn delete_plan(conn: &Connection, user_id: i64, plan_id: i64) -> Result<bool> {
    let count = conn.execute(
        "DELETE FROM study_plans WHERE id = ?1 AND user_id = ?2",
        params![plan_id, user_id],
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fallback;
    use crate::testing::TestEnv;

    fn seed_plan(conn: &Connection, user_id: i64) -> i64 {
        let generated = fallback::study_plan("Linear Algebra", 3, Difficulty::Beginner, 1.5);
        insert_plan(conn, user_id, Difficulty::Beginner, 1.5, "fallback", &generated).unwrap()
    }

    #[test]
    fn test_insert_and_get_plan() {
        let env = TestEnv::new().unwrap();
        let user_id = env.create_user("alice");
        let plan_id = seed_plan(&env.conn, user_id);

        let plan = get_plan(&env.conn, user_id, plan_id).unwrap().unwrap();
        assert_eq!(plan.subject, "Linear Algebra");
        assert_eq!(plan.duration_days, 3);
        assert_eq!(plan.source, "fallback");

        let days = get_plan_days(&env.conn, plan_id).unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].day_number, 1);
        assert!(!days[0].topics.is_empty());
    }

    #[test]
    fn test_plan_ownership_enforced() {
        let env = TestEnv::new().unwrap();
        let alice = env.create_user("alice");
        let bob = env.create_user("bob");
        let plan_id = seed_plan(&env.conn, alice);

        assert!(get_plan(&env.conn, bob, plan_id).unwrap().is_none());
        assert!(!delete_plan(&env.conn, bob, plan_id).unwrap());
        assert!(get_plan(&env.conn, alice, plan_id).unwrap().is_some());
    }

    #[test]
    fn test_complete_day_idempotent() {
        let env = TestEnv::new().unwrap();
        let user_id = env.create_user("alice");
        let plan_id = seed_plan(&env.conn, user_id);

        complete_day(&env.conn, plan_id, 1).unwrap();
        let first = get_plan_days(&env.conn, plan_id).unwrap()[0].completed_at;
        assert!(first.is_some());

        // Second completion keeps the original timestamp
        complete_day(&env.conn, plan_id, 1).unwrap();
        let second = get_plan_days(&env.conn, plan_id).unwrap()[0].completed_at;
        assert_eq!(first, second);

        uncomplete_day(&env.conn, plan_id, 1).unwrap();
        assert!(get_plan_days(&env.conn, plan_id).unwrap()[0].completed_at.is_none());
    }

    #[test]
    fn test_list_plans_counts() {
        let env = TestEnv::new().unwrap();
        let user_id = env.create_user("alice");
        let plan_id = seed_plan(&env.conn, user_id);
        complete_day(&env.conn, plan_id, 2).unwrap();

        let plans = list_plans(&env.conn, user_id).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].total_days, 3);
        assert_eq!(plans[0].completed_days, 1);
    }

    #[test]
    fn test_delete_plan_cascades() {
        let env = TestEnv::new().unwrap();
        let user_id = env.create_user("alice");
        let plan_id = seed_plan(&env.conn, user_id);

        assert!(delete_plan(&env.conn, user_id, plan_id).unwrap());
        assert!(get_plan_days(&env.conn, plan_id).unwrap().is_empty());
    }
}
