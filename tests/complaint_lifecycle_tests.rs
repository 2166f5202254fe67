mod common;

use common::TestContext;
use egov_portal::{
    error::AppError,
    lifecycle::{self, TRANSITIONS},
    models::{ComplaintStatus, Role},
    notifier::MockNotifier,
    repository::Repository,
    storage::MockStorageService,
};
use uuid::Uuid;

// --- Transition table ---

#[test]
fn test_transition_table_moves_one_step_forward() {
    for transition in &TRANSITIONS {
        assert_eq!(transition.to.rank(), transition.from.rank() + 1);
    }
    assert_eq!(
        lifecycle::next_transition(ComplaintStatus::Pending).map(|t| t.to),
        Some(ComplaintStatus::InProcess)
    );
    assert_eq!(
        lifecycle::next_transition(ComplaintStatus::InProcess).map(|t| t.to),
        Some(ComplaintStatus::Resolved)
    );
    assert!(lifecycle::is_terminal(ComplaintStatus::Resolved));
    assert!(!lifecycle::is_terminal(ComplaintStatus::Pending));
}

#[test]
fn test_confirmation_names_target_status() {
    let transition = lifecycle::next_transition(ComplaintStatus::Pending).unwrap();
    assert_eq!(
        transition.confirmation(),
        "Complaint status updated to in-process"
    );
}

// --- advance_status scenarios ---

#[tokio::test]
async fn test_full_lifecycle_notifies_owner_once_per_step() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;
    let complaint = ctx.file(&citizen, "Broken water main", "utilities").await;
    assert_eq!(complaint.status, ComplaintStatus::Pending);

    let first = ctx.service().advance_status(complaint.id, &admin).await.unwrap();
    assert_eq!(first.complaint.status, ComplaintStatus::InProcess);
    assert_eq!(first.message, "Complaint status updated to in-process");

    let second = ctx.service().advance_status(complaint.id, &admin).await.unwrap();
    assert_eq!(second.complaint.status, ComplaintStatus::Resolved);
    assert_eq!(second.message, "Complaint status updated to resolved");

    let third = ctx.service().advance_status(complaint.id, &admin).await;
    assert!(matches!(
        third,
        Err(AppError::InvalidTransition(ComplaintStatus::Resolved))
    ));

    let sent = ctx.notifier.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|n| n.user_id == citizen.id));
    assert_eq!(sent[0].subject, "Your complaint is now being processed");
    assert_eq!(sent[1].subject, "Your complaint has been resolved");
    assert!(sent[0].body.contains(&complaint.id.to_string()));
    assert!(sent[0].body.contains("Broken water main"));
}

#[tokio::test]
async fn test_non_admin_cannot_advance() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    let complaint = ctx.file(&citizen, "Pothole", "roads").await;

    let result = ctx.service().advance_status(complaint.id, &citizen).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    let stored = ctx.repo.get_complaint(complaint.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ComplaintStatus::Pending);
    assert!(ctx.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_resolved_complaint_rejects_admin_with_invalid_transition() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;
    let complaint = ctx.file(&citizen, "Noise", "environment").await;

    for _ in 0..2 {
        ctx.service().advance_status(complaint.id, &admin).await.unwrap();
    }

    let again = ctx.service().advance_status(complaint.id, &admin).await;
    assert!(matches!(
        again,
        Err(AppError::InvalidTransition(ComplaintStatus::Resolved))
    ));
}

#[tokio::test]
async fn test_resolved_complaint_rejects_owner_as_forbidden() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;
    let complaint = ctx.file(&citizen, "Noise", "environment").await;

    for _ in 0..2 {
        ctx.service().advance_status(complaint.id, &admin).await.unwrap();
    }

    let by_owner = ctx.service().advance_status(complaint.id, &citizen).await;
    assert!(matches!(by_owner, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_stranger_cannot_learn_resolved_state_of_foreign_complaint() {
    let ctx = TestContext::new();
    let owner = ctx.seed_user("owner", Role::User).await;
    let stranger = ctx.seed_user("stranger", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;
    let complaint = ctx.file(&owner, "Blocked drain", "sanitation").await;

    for _ in 0..2 {
        ctx.service().advance_status(complaint.id, &admin).await.unwrap();
    }

    let result = ctx.service().advance_status(complaint.id, &stranger).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let stored = ctx.repo.get_complaint(complaint.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ComplaintStatus::Resolved);
    // Only the two admin transitions were announced.
    assert_eq!(ctx.notifier.sent().await.len(), 2);
}

#[tokio::test]
async fn test_unknown_complaint_is_not_found() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("admin", Role::Admin).await;

    let result = ctx.service().advance_status(Uuid::new_v4(), &admin).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_notification_failure_keeps_new_status() {
    let ctx = TestContext::with(MockStorageService::new(), MockNotifier::new_failing());
    let citizen = ctx.seed_user("citizen", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;
    let complaint = ctx.file(&citizen, "Flooded underpass", "roads").await;

    let change = ctx.service().advance_status(complaint.id, &admin).await;

    assert!(change.is_ok());
    let stored = ctx.repo.get_complaint(complaint.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ComplaintStatus::InProcess);
    // The attempt was made exactly once.
    assert_eq!(ctx.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn test_store_failure_surfaces_as_internal() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;
    let complaint = ctx.file(&citizen, "Graffiti", "public-space").await;

    ctx.repo.set_offline(true);
    let result = ctx.service().advance_status(complaint.id, &admin).await;
    ctx.repo.set_offline(false);

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(ctx.notifier.sent().await.is_empty());
}
