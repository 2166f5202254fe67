mod common;

use common::TestContext;
use egov_portal::{
    complaints::ComplaintListing,
    models::{Complaint, ComplaintFilter, ComplaintStatus, Role},
    pagination::{Page, PageRequest},
};

fn all(listing: ComplaintListing) -> Vec<Complaint> {
    match listing {
        ComplaintListing::All(rows) => rows,
        ComplaintListing::Paged(page) => panic!("expected full listing, got page {page:?}"),
    }
}

fn paged(listing: ComplaintListing) -> Page<Complaint> {
    match listing {
        ComplaintListing::Paged(page) => page,
        ComplaintListing::All(_) => panic!("expected a page"),
    }
}

fn subjects(rows: &[Complaint]) -> Vec<&str> {
    rows.iter().map(|c| c.subject.as_str()).collect()
}

#[tokio::test]
async fn test_listing_scope_admin_owner_stranger() {
    let ctx = TestContext::new();
    let alice = ctx.seed_user("alice", Role::User).await;
    let bob = ctx.seed_user("bob", Role::User).await;
    let carol = ctx.seed_user("carol", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;

    ctx.file(&alice, "Alice one", "roads").await;
    ctx.file(&bob, "Bob one", "parks").await;
    ctx.file(&alice, "Alice two", "roads").await;

    let none = ComplaintFilter::default();

    let as_admin = all(ctx.service().list(&admin, &none, None).await.unwrap());
    assert_eq!(subjects(&as_admin), vec!["Alice two", "Bob one", "Alice one"]);

    let as_alice = all(ctx.service().list(&alice, &none, None).await.unwrap());
    assert_eq!(subjects(&as_alice), vec!["Alice two", "Alice one"]);
    assert!(as_alice.iter().all(|c| c.user_id == alice.id));

    let as_carol = all(ctx.service().list(&carol, &none, None).await.unwrap());
    assert!(as_carol.is_empty());
}

#[tokio::test]
async fn test_search_is_case_insensitive_across_fields() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    ctx.file(&citizen, "Broken STREETLIGHT", "lighting").await;
    ctx.file(&citizen, "Overflowing bin", "waste").await;

    let by_subject = ComplaintFilter {
        search: Some("streetlight".to_string()),
        ..ComplaintFilter::default()
    };
    let rows = all(ctx.service().list(&citizen, &by_subject, None).await.unwrap());
    assert_eq!(subjects(&rows), vec!["Broken STREETLIGHT"]);

    let by_category = ComplaintFilter {
        search: Some("WAST".to_string()),
        ..ComplaintFilter::default()
    };
    let rows = all(ctx.service().list(&citizen, &by_category, None).await.unwrap());
    assert_eq!(subjects(&rows), vec!["Overflowing bin"]);
}

#[tokio::test]
async fn test_search_matches_status_and_status_filter_is_exact() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;
    let moving = ctx.file(&citizen, "Moving", "roads").await;
    ctx.file(&citizen, "Waiting", "roads").await;
    ctx.service().advance_status(moving.id, &admin).await.unwrap();

    let search = ComplaintFilter {
        search: Some("process".to_string()),
        ..ComplaintFilter::default()
    };
    let rows = all(ctx.service().list(&admin, &search, None).await.unwrap());
    assert_eq!(subjects(&rows), vec!["Moving"]);

    let pending = ComplaintFilter {
        status: Some(ComplaintStatus::Pending),
        ..ComplaintFilter::default()
    };
    let rows = all(ctx.service().list(&admin, &pending, None).await.unwrap());
    assert_eq!(subjects(&rows), vec!["Waiting"]);
}

#[tokio::test]
async fn test_search_wildcards_are_literal() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    ctx.file(&citizen, "Pothole", "roads").await;

    for term in ["%", "_"] {
        let filter = ComplaintFilter {
            search: Some(term.to_string()),
            ..ComplaintFilter::default()
        };
        let rows = all(ctx.service().list(&citizen, &filter, None).await.unwrap());
        assert!(rows.is_empty(), "{term} should not act as a wildcard");
    }
}

#[tokio::test]
async fn test_subject_and_category_filters_are_exact_ignoring_case() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    ctx.file(&citizen, "Pothole", "Roads").await;
    ctx.file(&citizen, "Pothole on Main", "roads").await;
    ctx.file(&citizen, "Pothole", "parks").await;

    let filter = ComplaintFilter {
        subject: Some("POTHOLE".to_string()),
        category: Some("roads".to_string()),
        ..ComplaintFilter::default()
    };
    let rows = all(ctx.service().list(&citizen, &filter, None).await.unwrap());

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, "Roads");
}

#[tokio::test]
async fn test_pagination_envelope() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    for n in 1..=25 {
        ctx.file(&citizen, &format!("Complaint {n:02}"), "roads").await;
    }
    let none = ComplaintFilter::default();

    let first = paged(
        ctx.service()
            .list(&citizen, &none, PageRequest::from_query(Some(1), None))
            .await
            .unwrap(),
    );
    assert_eq!(first.total, 25);
    assert_eq!(first.data.len(), 10);
    assert_eq!(first.next, Some(2));
    assert_eq!(first.prev, None);
    assert_eq!(first.data[0].subject, "Complaint 25");

    let last = paged(
        ctx.service()
            .list(&citizen, &none, PageRequest::from_query(Some(3), Some(10)))
            .await
            .unwrap(),
    );
    assert_eq!(last.data.len(), 5);
    assert_eq!(last.next, None);
    assert_eq!(last.prev, Some(2));
    assert_eq!(last.data[4].subject, "Complaint 01");

    let beyond = paged(
        ctx.service()
            .list(&citizen, &none, PageRequest::from_query(Some(9), Some(10)))
            .await
            .unwrap(),
    );
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.total, 25);
}

#[test]
fn test_page_request_normalization() {
    assert_eq!(PageRequest::from_query(None, None), None);

    let clamped = PageRequest::new(Some(0), Some(1_000));
    assert_eq!(clamped.page, 1);
    assert_eq!(clamped.limit, 100);

    let defaulted = PageRequest::new(None, Some(0));
    assert_eq!(defaulted.limit, 1);
    assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
}

#[tokio::test]
async fn test_search_scope_for_admin_owner_and_stranger() {
    let ctx = TestContext::new();
    let owner = ctx.seed_user("owner", Role::User).await;
    let stranger = ctx.seed_user("stranger", Role::User).await;
    let admin = ctx.seed_user("admin", Role::Admin).await;
    let complaint = ctx.file(&owner, "streetlight", "infra").await;
    let search = ComplaintFilter {
        search: Some("streetlight".to_string()),
        ..ComplaintFilter::default()
    };

    for requester in [&admin, &owner] {
        let rows = all(ctx.service().list(requester, &search, None).await.unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, complaint.id);
    }
    let rows = all(ctx.service().list(&stranger, &search, None).await.unwrap());
    assert!(rows.is_empty());
}
