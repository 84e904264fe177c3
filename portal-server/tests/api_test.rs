//! End-to-end tests for the portal HTTP surface.
//!
//! Covers the submission → review → history lifecycle over a real socket:
//! submit (201/400/409), the interaction webhook (ping, approve, reject with
//! dialog), status lookup, history with filter and summary, and the session
//! endpoints, using an in-memory database, a fake notifier, and fake identity
//! providers.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use portal_core::PortalError;
use portal_server::{
    build_router, AppState, ChatIdentityProvider, ChatProfile, GameIdentityProvider, GameProfile,
    SessionStore,
};
use review::{Delivery, NotificationRef, Notifier, ReviewProtocol, SubmissionService};
use serde_json::{json, Value};
use storage::{ApplicationRecord, ApplicationRepository, SessionRepository, SqlitePoolManager};

const REVIEWER_ROLE: &str = "role-staff";

#[derive(Default)]
struct FakeNotifier {
    posts: Mutex<Vec<String>>,
    updates: Mutex<Vec<ApplicationRecord>>,
    fail_post: AtomicBool,
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn post(&self, record: &ApplicationRecord) -> portal_core::Result<Delivery> {
        if self.fail_post.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PortalError::Notification("post failed".to_string()));
        }
        self.posts.lock().unwrap().push(record.id.clone());
        Ok(Delivery::Interactive(NotificationRef {
            channel_id: "chan-1".to_string(),
            message_id: format!("msg-{}", self.posts.lock().unwrap().len()),
        }))
    }

    async fn update(&self, record: &ApplicationRecord) -> portal_core::Result<()> {
        self.updates.lock().unwrap().push(record.clone());
        Ok(())
    }
}

struct FakeGameProvider;

#[async_trait]
impl GameIdentityProvider for FakeGameProvider {
    async fn verify(&self, ticket: &str) -> Result<GameProfile, PortalError> {
        if ticket == "bad-ticket" {
            return Err(PortalError::Unauthorized(
                "Game login could not be verified.".to_string(),
            ));
        }
        Ok(GameProfile {
            game_id: format!("steam_{}", ticket),
            display_name: "Player One".to_string(),
            avatar_url: None,
        })
    }
}

struct FakeChatProvider;

#[async_trait]
impl ChatIdentityProvider for FakeChatProvider {
    async fn exchange_code(&self, code: &str) -> Result<ChatProfile, PortalError> {
        Ok(ChatProfile {
            chat_id: format!("chat_{}", code),
            username: Some("player_one".to_string()),
            avatar: None,
            email: None,
        })
    }
}

struct TestApp {
    base_url: String,
    client: reqwest::Client,
    notifier: Arc<FakeNotifier>,
}

async fn spawn_app() -> TestApp {
    let pool_manager = SqlitePoolManager::new("sqlite::memory:")
        .await
        .expect("Failed to create pool");
    let applications = ApplicationRepository::new(pool_manager.clone())
        .await
        .expect("Failed to create application repo");
    let session_repo = SessionRepository::new(pool_manager)
        .await
        .expect("Failed to create session repo");

    let notifier = Arc::new(FakeNotifier::default());
    let notifier_seam: Arc<dyn Notifier> = notifier.clone();

    let state = AppState {
        submissions: Arc::new(SubmissionService::new(
            applications.clone(),
            notifier_seam.clone(),
        )),
        protocol: Arc::new(ReviewProtocol::new(
            applications.clone(),
            notifier_seam,
            Some(REVIEWER_ROLE.to_string()),
        )),
        applications,
        sessions: SessionStore::new(session_repo),
        game_identity: Arc::new(FakeGameProvider),
        chat_identity: Arc::new(FakeChatProvider),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    let router = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        notifier,
    }
}

fn submission_body(chat_id: &str, game_id: &str) -> Value {
    json!({
        "chat_id": chat_id,
        "game_id": game_id,
        "character_name": "Anna",
        "birth_date": "2000-01-01",
        "backstory": "x".repeat(120),
        "reason": "y".repeat(20),
    })
}

fn component_press(custom_id: &str, roles: Vec<&str>) -> Value {
    json!({
        "type": 3,
        "data": { "custom_id": custom_id },
        "member": {
            "user": { "id": "mod-1", "username": "mod_anna" },
            "roles": roles,
        }
    })
}

/// **Test: The full lifecycle: submit, duplicate conflict, approve, history.**
///
/// **Setup:** Fresh app; one valid submission for chat "u1" / game "g1".
/// **Action:** Scenario A (submit), B (duplicate), C (approve via webhook),
/// E (history filtered to approved).
/// **Expected:** 201 pending → 409 naming "pending" → approve ack and
/// approved status with reviewed_at → history shows one approved result with
/// summary totals.
#[tokio::test]
async fn test_submission_review_lifecycle() {
    let app = spawn_app().await;

    // Scenario A: submit.
    let response = app
        .client
        .post(format!("{}/api/applications", app.base_url))
        .json(&submission_body("u1", "g1234"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["status"], "pending");
    let application_id = created["id"].as_str().unwrap().to_string();
    assert!(created.get("ip_address").is_none());
    assert!(created.get("notification_message_id").is_none());

    // Scenario B: duplicate while pending.
    let response = app
        .client
        .post(format!("{}/api/applications", app.base_url))
        .json(&submission_body("u1", "g1234"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let conflict: Value = response.json().await.unwrap();
    assert!(conflict["error"].as_str().unwrap().contains("pending"));

    // Scenario C: approve from the chat platform.
    let response = app
        .client
        .post(format!("{}/api/interactions", app.base_url))
        .json(&component_press(
            &format!("wl_approve:{}", application_id),
            vec![REVIEWER_ROLE],
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["type"], 4);
    assert_eq!(reply["data"]["flags"], 64);
    assert!(reply["data"]["content"].as_str().unwrap().contains("approved"));

    let response = app
        .client
        .get(format!("{}/api/applications/status/g1234", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["status"], "approved");
    assert!(!status["reviewed_at"].is_null());

    // The re-render after approval carries no pending status.
    let updates = app.notifier.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert!(!updates[0].is_pending());
    drop(updates);

    // Scenario E: history filtered to approved.
    let response = app
        .client
        .get(format!(
            "{}/api/applications/history/u1?status=approved",
            app.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let history: Value = response.json().await.unwrap();
    assert_eq!(history["applications"].as_array().unwrap().len(), 1);
    assert_eq!(history["summary"]["approved"], 1);
    assert_eq!(history["summary"]["total"], 1);
    assert_eq!(history["pagination"]["total"], 1);
}

/// **Test: Rejection goes through the dialog and stores the reason.**
///
/// **Setup:** One pending submission for "u2".
/// **Action:** Reject button (expects a dialog reply), then the dialog submit
/// with reason "Thiếu thông tin" (Scenario D).
/// **Expected:** Dialog reply type 9; after submit the record is rejected and
/// feedback equals the reason.
#[tokio::test]
async fn test_rejection_dialog_flow() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/applications", app.base_url))
        .json(&submission_body("u2", "g5678"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    let application_id = created["id"].as_str().unwrap().to_string();

    let response = app
        .client
        .post(format!("{}/api/interactions", app.base_url))
        .json(&component_press(
            &format!("wl_reject:{}", application_id),
            vec![REVIEWER_ROLE],
        ))
        .send()
        .await
        .unwrap();
    let dialog: Value = response.json().await.unwrap();
    assert_eq!(dialog["type"], 9);
    let dialog_custom_id = dialog["data"]["custom_id"].as_str().unwrap().to_string();
    assert_eq!(
        dialog_custom_id,
        format!("wl_reject_reason:{}", application_id)
    );

    let response = app
        .client
        .post(format!("{}/api/interactions", app.base_url))
        .json(&json!({
            "type": 5,
            "data": {
                "custom_id": dialog_custom_id,
                "components": [{
                    "components": [{ "custom_id": "reason", "value": "Thiếu thông tin" }]
                }]
            },
            "member": {
                "user": { "id": "mod-1", "username": "mod_anna" },
                "roles": [REVIEWER_ROLE],
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .get(format!("{}/api/applications/status/g5678", app.base_url))
        .send()
        .await
        .unwrap();
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["status"], "rejected");
    assert_eq!(status["feedback"], "Thiếu thông tin");
}

/// **Test: Ping verification and webhook edge cases.**
///
/// **Setup:** Fresh app.
/// **Action:** Ping payload; an approve press without the reviewer role; an
/// approve press for an unknown id; malformed JSON.
/// **Expected:** Pong; permission-denied ack leaving nothing mutated;
/// not-found ack; 400.
#[tokio::test]
async fn test_interaction_edge_cases() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/interactions", app.base_url))
        .json(&json!({ "type": 1 }))
        .send()
        .await
        .unwrap();
    let pong: Value = response.json().await.unwrap();
    assert_eq!(pong["type"], 1);

    let response = app
        .client
        .post(format!("{}/api/applications", app.base_url))
        .json(&submission_body("u3", "g9999"))
        .send()
        .await
        .unwrap();
    let created: Value = response.json().await.unwrap();
    let application_id = created["id"].as_str().unwrap().to_string();

    let response = app
        .client
        .post(format!("{}/api/interactions", app.base_url))
        .json(&component_press(
            &format!("wl_approve:{}", application_id),
            vec!["role-member"],
        ))
        .send()
        .await
        .unwrap();
    let denied: Value = response.json().await.unwrap();
    assert!(denied["data"]["content"]
        .as_str()
        .unwrap()
        .contains("permission"));

    let response = app
        .client
        .get(format!("{}/api/applications/status/g9999", app.base_url))
        .send()
        .await
        .unwrap();
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["status"], "pending");

    let response = app
        .client
        .post(format!("{}/api/interactions", app.base_url))
        .json(&component_press("wl_approve:does-not-exist", vec![REVIEWER_ROLE]))
        .send()
        .await
        .unwrap();
    let not_found: Value = response.json().await.unwrap();
    assert!(not_found["data"]["content"]
        .as_str()
        .unwrap()
        .contains("not found"));

    let response = app
        .client
        .post(format!("{}/api/interactions", app.base_url))
        .json(&json!({ "kind": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

/// **Test: Validation failures come back as a field list; nothing is stored.**
///
/// **Setup:** Fresh app.
/// **Action:** Submit with an under-length backstory and reason.
/// **Expected:** 400 with errors for both fields; status endpoint 404s.
#[tokio::test]
async fn test_validation_errors_are_field_level() {
    let app = spawn_app().await;

    let mut body = submission_body("u4", "g4444");
    body["backstory"] = json!("too short");
    body["reason"] = json!("nope");

    let response = app
        .client
        .post(format!("{}/api/applications", app.base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let errors: Value = response.json().await.unwrap();
    let fields: Vec<&str> = errors["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"backstory"));
    assert!(fields.contains(&"reason"));

    let response = app
        .client
        .get(format!("{}/api/applications/status/g4444", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

/// **Test: History 404s only for unknown identifiers, not empty filters.**
///
/// **Setup:** One pending submission for "u5".
/// **Action:** History for "nobody"; history for "u5" filtered to rejected;
/// history with a bogus status value.
/// **Expected:** 404; 200 with an empty page but summary.total = 1; 400.
#[tokio::test]
async fn test_history_not_found_asymmetry() {
    let app = spawn_app().await;

    app.client
        .post(format!("{}/api/applications", app.base_url))
        .json(&submission_body("u5", "g5555"))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .get(format!("{}/api/applications/history/nobody", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = app
        .client
        .get(format!(
            "{}/api/applications/history/u5?status=rejected",
            app.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let history: Value = response.json().await.unwrap();
    assert_eq!(history["applications"].as_array().unwrap().len(), 0);
    assert_eq!(history["summary"]["total"], 1);

    let response = app
        .client
        .get(format!(
            "{}/api/applications/history/u5?status=bogus",
            app.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

/// **Test: Notification failure still returns 201 with a persisted record.**
///
/// **Setup:** Fake notifier switched to failing mode.
/// **Action:** Submit; then fetch status.
/// **Expected:** 201; status endpoint finds the pending record.
#[tokio::test]
async fn test_submission_survives_notification_outage() {
    let app = spawn_app().await;
    app.notifier
        .fail_post
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let response = app
        .client
        .post(format!("{}/api/applications", app.base_url))
        .json(&submission_body("u6", "g6666"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = app
        .client
        .get(format!("{}/api/applications/status/g6666", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

/// **Test: Session issue, identity view, and chat link/unlink.**
///
/// **Setup:** Fake identity providers.
/// **Action:** Game callback with a ticket; `GET /api/auth/me`; link a chat
/// account; unlink it; callback with a bad ticket.
/// **Expected:** Token issued and identities bound/unbound as requested;
/// the bad ticket yields 401.
#[tokio::test]
async fn test_session_identity_binding() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/auth/game/callback", app.base_url))
        .json(&json!({ "ticket": "abc123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let issued: Value = response.json().await.unwrap();
    let token = issued["token"].as_str().unwrap().to_string();
    assert_eq!(issued["profile"]["game_id"], "steam_abc123");

    let response = app
        .client
        .get(format!("{}/api/auth/me", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["game_id"], "steam_abc123");
    assert!(me["chat_id"].is_null());

    let response = app
        .client
        .post(format!("{}/api/auth/chat/link", app.base_url))
        .bearer_auth(&token)
        .json(&json!({ "code": "oauth-code" }))
        .send()
        .await
        .unwrap();
    let linked: Value = response.json().await.unwrap();
    assert_eq!(linked["chat_id"], "chat_oauth-code");

    let response = app
        .client
        .delete(format!("{}/api/auth/chat/link", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let unlinked: Value = response.json().await.unwrap();
    assert!(unlinked["chat_id"].is_null());
    assert_eq!(unlinked["game_id"], "steam_abc123");

    let response = app
        .client
        .post(format!("{}/api/auth/game/callback", app.base_url))
        .json(&json!({ "ticket": "bad-ticket" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
