//! Simple in-memory storage for active study sessions.
//!
//! Tracks one timed study session per user (which plan day they are working
//! on and when they started). Sessions auto-expire after a configurable
//! duration of inactivity.

use crate::config;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

/// An active timed study session
#[derive(Debug, Clone, Serialize)]
pub struct StudySession {
    pub plan_id: i64,
    pub day_number: i64,
    pub started_at: DateTime<Utc>,
}

impl StudySession {
    /// Whole minutes elapsed since the session started, at least 0
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_minutes().max(0)
    }
}

/// Session entry with last access time for expiration
struct SessionEntry {
    session: StudySession,
    last_access: DateTime<Utc>,
}

/// Global session store, keyed by user id
static SESSIONS: LazyLock<Mutex<HashMap<i64, SessionEntry>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Start a session for the user, replacing any existing one
pub fn start_session(user_id: i64, plan_id: i64, day_number: i64) -> StudySession {
    let now = Utc::now();
    let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
        cleanup_expired(&mut sessions, expiry_cutoff(now));
    }

    let session = StudySession {
        plan_id,
        day_number,
        started_at: now,
    };
    sessions.insert(
        user_id,
        SessionEntry {
            session: session.clone(),
            last_access: now,
        },
    );
    session
}

/// Get the user's active session, if any
pub fn current_session(user_id: i64) -> Option<StudySession> {
    current_session_at(user_id, Utc::now())
}

fn current_session_at(user_id: i64, now: DateTime<Utc>) -> Option<StudySession> {
    let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");

    let entry = sessions.get_mut(&user_id)?;
    if entry.last_access < expiry_cutoff(now) {
        sessions.remove(&user_id);
        return None;
    }
    entry.last_access = now;
    Some(entry.session.clone())
}

/// Remove and return the user's active session
pub fn finish_session(user_id: i64) -> Option<StudySession> {
    finish_session_at(user_id, Utc::now())
}

fn finish_session_at(user_id: i64, now: DateTime<Utc>) -> Option<StudySession> {
    let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");

    let entry = sessions.remove(&user_id)?;
    if entry.last_access < expiry_cutoff(now) {
        return None;
    }
    Some(entry.session)
}

/// Last-access times older than this are considered idle
fn expiry_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(config::STUDY_SESSION_EXPIRY_HOURS)
}

/// Clean up expired sessions
fn cleanup_expired(sessions: &mut HashMap<i64, SessionEntry>, cutoff: DateTime<Utc>) {
    sessions.retain(|_, entry| entry.last_access > cutoff);
}

#[cfg(test)]
mod tests {
    use super::*;

    // The store is global, so each test uses distinct user ids
    #[test]
    fn test_start_and_current() {
        let session = start_session(9_000_001, 1, 2);
        assert_eq!(session.plan_id, 1);

        let current = current_session(9_000_001).unwrap();
        assert_eq!(current.day_number, 2);
    }

    #[test]
    fn test_start_replaces_existing() {
        start_session(9_000_002, 1, 1);
        start_session(9_000_002, 5, 3);

        let current = current_session(9_000_002).unwrap();
        assert_eq!(current.plan_id, 5);
        assert_eq!(current.day_number, 3);
    }

    #[test]
    fn test_finish_removes_session() {
        start_session(9_000_003, 1, 1);
        assert!(finish_session(9_000_003).is_some());
        assert!(current_session(9_000_003).is_none());
        assert!(finish_session(9_000_003).is_none());
    }

    #[test]
    fn test_idle_session_expires() {
        start_session(9_000_004, 1, 1);

        let idle = Utc::now() + Duration::hours(config::STUDY_SESSION_EXPIRY_HOURS + 1);
        assert!(current_session_at(9_000_004, idle).is_none());
        // The expired entry is removed, not just hidden
        assert!(current_session(9_000_004).is_none());
    }

    #[test]
    fn test_fresh_session_survives_expiry_check() {
        start_session(9_000_005, 1, 1);

        let later = Utc::now() + Duration::hours(1);
        assert!(current_session_at(9_000_005, later).is_some());
    }

    #[test]
    fn test_finish_ignores_idle_session() {
        start_session(9_000_006, 1, 1);

        let idle = Utc::now() + Duration::hours(config::STUDY_SESSION_EXPIRY_HOURS + 1);
        assert!(finish_session_at(9_000_006, idle).is_none());
    }

    #[test]
    fn test_cleanup_drops_only_idle_entries() {
        let now = Utc::now();
        let entry = |last_access| SessionEntry {
            session: StudySession {
                plan_id: 1,
                day_number: 1,
                started_at: now,
            },
            last_access,
        };

        let mut sessions = HashMap::new();
        sessions.insert(1, entry(now));
        sessions.insert(
            2,
            entry(now - Duration::hours(config::STUDY_SESSION_EXPIRY_HOURS + 1)),
        );

        cleanup_expired(&mut sessions, expiry_cutoff(now));
        assert!(sessions.contains_key(&1));
        assert!(!sessions.contains_key(&2));
    }

    #[test]
    fn test_elapsed_minutes_never_negative() {
        let session = StudySession {
            plan_id: 1,
            day_number: 1,
            started_at: Utc::now() + Duration::minutes(5),
        };
        assert_eq!(session.elapsed_minutes(Utc::now()), 0);
    }
}
