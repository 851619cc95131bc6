//! End-to-end API tests against the full router.
//!
//! The AI service is given an empty provider chain, so all generation goes
//! through the deterministic fallback templates.

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use studyhub::ai::AiService;
use studyhub::state::AppState;

struct TestApp {
    server: TestServer,
    // Kept alive so the database file outlives the test
    _temp: TempDir,
}

fn spawn_app() -> TestApp {
    let temp = TempDir::new().unwrap();
    let conn = Connection::open(temp.path().join("studyhub.db")).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    studyhub::db::schema::run_migrations(&conn).unwrap();

    let state = AppState::new(
        Arc::new(Mutex::new(conn)),
        Arc::new(AiService::with_providers(vec![])),
    );
    TestApp {
        server: TestServer::new(studyhub::app(state)).unwrap(),
        _temp: temp,
    }
}

/// Register a user and return their bearer token
async fn register(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct horse battery",
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_login_and_me() {
    let app = spawn_app();
    let token = register(&app.server, "alice").await;

    let me = app
        .server
        .get("/api/auth/me")
        .authorization_bearer(&token)
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["username"], "alice");

    // Fresh login issues a new working token
    let login = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "correct horse battery" }))
        .await;
    login.assert_status_ok();
    let login_token = login.json::<Value>()["token"].as_str().unwrap().to_string();
    assert_ne!(login_token, token);

    app.server
        .get("/api/auth/me")
        .authorization_bearer(&login_token)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let app = spawn_app();
    register(&app.server, "alice").await;

    let dup_username = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "password123",
        }))
        .await;
    dup_username.assert_status_bad_request();

    let dup_email = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice2",
            "email": "alice@example.com",
            "password": "password123",
        }))
        .await;
    dup_email.assert_status_bad_request();
}

#[tokio::test]
async fn protected_routes_require_valid_token() {
    let app = spawn_app();

    app.server.get("/api/study/plans").await.assert_status_unauthorized();
    app.server
        .get("/api/study/plans")
        .authorization_bearer("not-a-real-token")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn logout_invalidates_token() {
    let app = spawn_app();
    let token = register(&app.server, "alice").await;

    app.server
        .post("/api/auth/logout")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    app.server
        .get("/api/auth/me")
        .authorization_bearer(&token)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn plan_lifecycle_via_fallback() {
    let app = spawn_app();
    let token = register(&app.server, "alice").await;

    let created = app
        .server
        .post("/api/study/plans")
        .authorization_bearer(&token)
        .json(&json!({
            "subject": "Spanish",
            "duration_days": 5,
            "difficulty": "intermediate",
            "hours_per_day": 1.5,
        }))
        .await;
    created.assert_status_ok();
    let plan = created.json::<Value>();
    assert_eq!(plan["source"], "fallback");
    assert_eq!(plan["days"].as_array().unwrap().len(), 5);
    let plan_id = plan["id"].as_i64().unwrap();

    // Completing a day twice is idempotent
    for _ in 0..2 {
        app.server
            .post(&format!("/api/study/plans/{plan_id}/days/1/complete"))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
    }

    let listed = app
        .server
        .get("/api/study/plans")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(listed[0]["total_days"], 5);
    assert_eq!(listed[0]["completed_days"], 1);

    let progress = app
        .server
        .get("/api/study/progress")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(progress["completed_plan_days"], 1);
    assert_eq!(progress["streak_days"], 1);

    app.server
        .delete(&format!("/api/study/plans/{plan_id}"))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
    app.server
        .get(&format!("/api/study/plans/{plan_id}"))
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn plan_validation_errors() {
    let app = spawn_app();
    let token = register(&app.server, "alice").await;

    let too_long = app
        .server
        .post("/api/study/plans")
        .authorization_bearer(&token)
        .json(&json!({ "subject": "Spanish", "duration_days": 91 }))
        .await;
    too_long.assert_status_bad_request();

    let bad_difficulty = app
        .server
        .post("/api/study/plans")
        .authorization_bearer(&token)
        .json(&json!({
            "subject": "Spanish",
            "duration_days": 3,
            "difficulty": "expert",
        }))
        .await;
    bad_difficulty.assert_status_bad_request();
}

#[tokio::test]
async fn plans_are_private_to_their_owner() {
    let app = spawn_app();
    let alice = register(&app.server, "alice").await;
    let bob = register(&app.server, "bob").await;

    let plan = app
        .server
        .post("/api/study/plans")
        .authorization_bearer(&alice)
        .json(&json!({ "subject": "Chemistry", "duration_days": 2 }))
        .await
        .json::<Value>();
    let plan_id = plan["id"].as_i64().unwrap();

    app.server
        .get(&format!("/api/study/plans/{plan_id}"))
        .authorization_bearer(&bob)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn quiz_taking_and_grading() {
    let app = spawn_app();
    let token = register(&app.server, "alice").await;

    let created = app
        .server
        .post("/api/study/quizzes")
        .authorization_bearer(&token)
        .json(&json!({
            "topic": "Photosynthesis",
            "question_count": 4,
            "difficulty": "beginner",
        }))
        .await;
    created.assert_status_ok();
    let quiz = created.json::<Value>();
    assert_eq!(quiz["source"], "fallback");
    let quiz_id = quiz["id"].as_i64().unwrap();

    // The taking view must not leak the answer key
    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 4);
    for q in questions {
        assert!(q.get("correct_index").is_none());
        assert!(q.get("explanation").is_none());
        assert_eq!(q["options"].as_array().unwrap().len(), 4);
    }

    // Wrong answer count is rejected
    app.server
        .post(&format!("/api/study/quizzes/{quiz_id}/attempts"))
        .authorization_bearer(&token)
        .json(&json!({ "answers": [0, 1] }))
        .await
        .assert_status_bad_request();

    // First attempt reveals the key; use it for a perfect second attempt
    let first = app
        .server
        .post(&format!("/api/study/quizzes/{quiz_id}/attempts"))
        .authorization_bearer(&token)
        .json(&json!({ "answers": [0, 0, 0, 0] }))
        .await
        .json::<Value>();
    assert_eq!(first["total"], 4);
    let key: Vec<i64> = first["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["correct_index"].as_i64().unwrap())
        .collect();

    let second = app
        .server
        .post(&format!("/api/study/quizzes/{quiz_id}/attempts"))
        .authorization_bearer(&token)
        .json(&json!({ "answers": key }))
        .await
        .json::<Value>();
    assert_eq!(second["score"], 4);
    assert!(second["results"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["correct"] == true));

    let attempts = app
        .server
        .get(&format!("/api/study/quizzes/{quiz_id}/attempts"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(attempts.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn study_session_flow() {
    let app = spawn_app();
    let token = register(&app.server, "session_user").await;

    let plan = app
        .server
        .post("/api/study/plans")
        .authorization_bearer(&token)
        .json(&json!({ "subject": "History", "duration_days": 3 }))
        .await
        .json::<Value>();
    let plan_id = plan["id"].as_i64().unwrap();

    app.server
        .get("/api/study/sessions/current")
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();

    let started = app
        .server
        .post("/api/study/sessions/start")
        .authorization_bearer(&token)
        .json(&json!({ "plan_id": plan_id, "day_number": 2 }))
        .await;
    started.assert_status_ok();

    let current = app
        .server
        .get("/api/study/sessions/current")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(current["day_number"], 2);

    let finished = app
        .server
        .post("/api/study/sessions/finish")
        .authorization_bearer(&token)
        .json(&json!({ "mark_complete": true }))
        .await
        .json::<Value>();
    assert_eq!(finished["marked_complete"], true);

    // The session is gone and the day is marked complete
    app.server
        .get("/api/study/sessions/current")
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();
    let detail = app
        .server
        .get(&format!("/api/study/plans/{plan_id}"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert!(!detail["days"][1]["completed_at"].is_null());

    // Starting against an unknown plan day is a 404
    app.server
        .post("/api/study/sessions/start")
        .authorization_bearer(&token)
        .json(&json!({ "plan_id": plan_id, "day_number": 99 }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn group_membership_rules() {
    let app = spawn_app();
    let alice = register(&app.server, "alice").await;
    let bob = register(&app.server, "bob").await;

    let group = app
        .server
        .post("/api/study-groups")
        .authorization_bearer(&alice)
        .json(&json!({ "name": "Bio club", "subject": "Biology" }))
        .await
        .json::<Value>();
    let group_id = group["id"].as_i64().unwrap();
    assert_eq!(group["members"].as_array().unwrap().len(), 1);

    // Non-members cannot read or post messages
    app.server
        .get(&format!("/api/study-groups/{group_id}/messages"))
        .authorization_bearer(&bob)
        .await
        .assert_status_forbidden();
    app.server
        .post(&format!("/api/study-groups/{group_id}/messages"))
        .authorization_bearer(&bob)
        .json(&json!({ "body": "hi" }))
        .await
        .assert_status_forbidden();

    app.server
        .post(&format!("/api/study-groups/{group_id}/join"))
        .authorization_bearer(&bob)
        .await
        .assert_status_ok();

    app.server
        .post(&format!("/api/study-groups/{group_id}/messages"))
        .authorization_bearer(&bob)
        .json(&json!({ "body": "hello everyone" }))
        .await
        .assert_status_ok();
    let messages = app
        .server
        .get(&format!("/api/study-groups/{group_id}/messages"))
        .authorization_bearer(&alice)
        .await
        .json::<Value>();
    assert_eq!(messages[0]["username"], "bob");

    // Owner cannot leave, members can, only the owner deletes
    app.server
        .post(&format!("/api/study-groups/{group_id}/leave"))
        .authorization_bearer(&alice)
        .await
        .assert_status_bad_request();
    app.server
        .delete(&format!("/api/study-groups/{group_id}"))
        .authorization_bearer(&bob)
        .await
        .assert_status_forbidden();
    app.server
        .post(&format!("/api/study-groups/{group_id}/leave"))
        .authorization_bearer(&bob)
        .await
        .assert_status_ok();
    app.server
        .delete(&format!("/api/study-groups/{group_id}"))
        .authorization_bearer(&alice)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn chat_persists_conversation() {
    let app = spawn_app();
    let token = register(&app.server, "alice").await;

    let first = app
        .server
        .post("/api/ai/chat")
        .authorization_bearer(&token)
        .json(&json!({ "message": "how do I start?", "subject": "Calculus" }))
        .await;
    first.assert_status_ok();
    let first = first.json::<Value>();
    assert_eq!(first["source"], "fallback");
    assert!(first["reply"].as_str().unwrap().contains("Calculus"));
    let conversation_id = first["conversation_id"].as_i64().unwrap();

    // Second turn continues the same thread
    let second = app
        .server
        .post("/api/ai/chat")
        .authorization_bearer(&token)
        .json(&json!({ "message": "thanks", "conversation_id": conversation_id }))
        .await
        .json::<Value>();
    assert_eq!(second["conversation_id"].as_i64().unwrap(), conversation_id);

    let detail = app
        .server
        .get(&format!("/api/ai/conversations/{conversation_id}"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    let messages = detail["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");

    app.server
        .delete(&format!("/api/ai/conversations/{conversation_id}"))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
    app.server
        .get(&format!("/api/ai/conversations/{conversation_id}"))
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn empty_chat_message_rejected() {
    let app = spawn_app();
    let token = register(&app.server, "alice").await;

    app.server
        .post("/api/ai/chat")
        .authorization_bearer(&token)
        .json(&json!({ "message": "   " }))
        .await
        .assert_status_bad_request();
}
