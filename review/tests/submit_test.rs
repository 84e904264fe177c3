//! Integration tests for [`review::SubmissionService`].
//!
//! Covers the validate → gate → persist → notify pipeline with an in-memory
//! repository and the fake notifier: happy path with linkage storage,
//! validation collecting every failure, pending/approved conflicts, and
//! notification failure never failing the submission.


use std::sync::atomic::Ordering;
use std::sync::Arc;

use fake_notifier::FakeNotifier;
use portal_core::PortalError;
use review::{SubmissionInput, SubmissionService};
use storage::{ApplicationRepository, ApplicationStatus};

async fn service_with_notifier() -> (SubmissionService, Arc<FakeNotifier>, ApplicationRepository) {
    let repo = ApplicationRepository::connect("sqlite::memory:")
        .await
        .expect("Failed to create repository");
    let notifier = Arc::new(FakeNotifier::new());
    let service = SubmissionService::new(repo.clone(), notifier.clone());
    (service, notifier, repo)
}

fn valid_input(chat_id: &str, game_id: &str) -> SubmissionInput {
    SubmissionInput {
        chat_id: chat_id.to_string(),
        game_id: game_id.to_string(),
        character_name: "Anna".to_string(),
        birth_date: "2000-01-01".to_string(),
        backstory: "x".repeat(120),
        reason: "y".repeat(20),
        ip_address: Some("127.0.0.1".to_string()),
        user_agent: Some("test-client".to_string()),
    }
}

/// **Test: A valid submission creates a pending record and posts one notification.**
///
/// **Setup:** Empty repository, fake notifier in interactive mode.
/// **Action:** `submit(valid_input)`.
/// **Expected:** Record pending with no review metadata; notifier posted once;
/// the stored row carries the notification reference.
#[tokio::test]
async fn test_valid_submission_creates_pending_record() {
    let (service, notifier, repo) = service_with_notifier().await;

    let record = service.submit(valid_input("u1", "game_1")).await.unwrap();

    assert_eq!(record.status, ApplicationStatus::Pending);
    assert!(record.reviewed_at.is_none());
    assert!(record.age() >= 16);
    assert_eq!(notifier.post_count(), 1);

    let stored = repo.find_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(stored.notification_channel_id.as_deref(), Some("chan-1"));
    assert!(stored.notification_message_id.is_some());
}

/// **Test: Validation failures list every failing field and create nothing.**
///
/// **Setup:** Input with a 99-char backstory and a 9-char reason.
/// **Action:** `submit(input)`.
/// **Expected:** `PortalError::Validation` naming both fields; repository has
/// no record; notifier never called.
#[tokio::test]
async fn test_invalid_submission_creates_no_record() {
    let (service, notifier, repo) = service_with_notifier().await;

    let mut input = valid_input("u1", "game_1");
    input.backstory = "x".repeat(99);
    input.reason = "y".repeat(9);

    let err = service.submit(input).await.unwrap_err();
    match err {
        PortalError::Validation(fields) => {
            let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
            assert!(names.contains(&"backstory"));
            assert!(names.contains(&"reason"));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }

    assert!(repo.find_active_by_chat_id("u1").await.unwrap().is_none());
    assert_eq!(notifier.post_count(), 0);
}

/// **Test: A second submission while one is pending conflicts, naming "pending".**
///
/// **Setup:** One submitted (pending) application for "u1".
/// **Action:** Submit again with the same chat_id.
/// **Expected:** `PortalError::Conflict` whose message contains "pending"; only
/// one record exists.
#[tokio::test]
async fn test_duplicate_pending_submission_conflicts() {
    let (service, _notifier, repo) = service_with_notifier().await;

    service.submit(valid_input("u1", "game_1")).await.unwrap();
    let err = service.submit(valid_input("u1", "game_1b")).await.unwrap_err();

    match err {
        PortalError::Conflict(message) => assert!(message.contains("pending")),
        other => panic!("Expected conflict, got {:?}", other),
    }

    let page = repo
        .history(&storage::HistoryQuery::new("u1"))
        .await
        .unwrap();
    assert_eq!(page.summary.total, 1);
}

/// **Test: An approved application blocks new submissions, naming "approved".**
///
/// **Setup:** Submit for "u2", transition the record to approved.
/// **Action:** Submit again with the same chat_id.
/// **Expected:** `PortalError::Conflict` whose message contains "approved".
#[tokio::test]
async fn test_approved_application_blocks_resubmission() {
    let (service, _notifier, repo) = service_with_notifier().await;

    let record = service.submit(valid_input("u2", "game_2")).await.unwrap();
    repo.transition(&record.id, ApplicationStatus::Approved, "mod1", "Mod", "")
        .await
        .unwrap();

    let err = service.submit(valid_input("u2", "game_2b")).await.unwrap_err();
    match err {
        PortalError::Conflict(message) => assert!(message.contains("approved")),
        other => panic!("Expected conflict, got {:?}", other),
    }
}

/// **Test: Notification failure does not fail the submission.**
///
/// **Setup:** Fake notifier set to fail post().
/// **Action:** `submit(valid_input)`.
/// **Expected:** Ok with a persisted pending record; no notification linkage.
#[tokio::test]
async fn test_notification_failure_keeps_submission() {
    let (service, notifier, repo) = service_with_notifier().await;
    notifier.fail_post.store(true, Ordering::SeqCst);

    let record = service.submit(valid_input("u3", "game_3")).await.unwrap();

    let stored = repo.find_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ApplicationStatus::Pending);
    assert!(stored.notification_message_id.is_none());
    assert!(stored.notification_channel_id.is_none());
}

/// **Test: Degraded delivery stores no linkage but succeeds.**
///
/// **Setup:** Fake notifier in degraded mode (fallback content, no controls).
/// **Action:** `submit(valid_input)`.
/// **Expected:** Ok; notifier posted once; linkage stays empty so later
/// updates are no-ops.
#[tokio::test]
async fn test_degraded_delivery_stores_no_linkage() {
    let (service, notifier, repo) = service_with_notifier().await;
    notifier.degraded_post.store(true, Ordering::SeqCst);

    let record = service.submit(valid_input("u4", "game_4")).await.unwrap();

    assert_eq!(notifier.post_count(), 1);
    let stored = repo.find_by_id(&record.id).await.unwrap().unwrap();
    assert!(stored.notification_message_id.is_none());
}
