mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::TestContext;
use egov_portal::{
    create_router,
    models::{PresignedUrlRequest, PresignedUrlResponse, Role},
    notifier::MockNotifier,
    storage::MockStorageService,
};
use tower::util::ServiceExt;

fn presign_request(user: &str, filename: &str, file_type: &str) -> Request<Body> {
    let payload = PresignedUrlRequest {
        filename: filename.to_string(),
        file_type: file_type.to_string(),
    };
    Request::builder()
        .method("POST")
        .uri("/upload/presigned")
        .header("Content-Type", "application/json")
        .header("x-user-id", user)
        .body(Body::from(serde_json::to_string(&payload).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_presigned_url_success() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;
    let app = create_router(ctx.state.clone());

    let response = app
        .oneshot(presign_request(&citizen.id.to_string(), "pothole.JPG", "image/jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: PresignedUrlResponse = serde_json::from_slice(&body_bytes).unwrap();

    assert!(body_json.upload_url.contains("signature=fake"));
    assert!(body_json.resource_key.starts_with("complaints/"));
    assert!(body_json.resource_key.ends_with(".jpg"));
    assert!(body_json.resource_url.ends_with(&body_json.resource_key));
}

#[tokio::test]
async fn test_presigned_url_rejects_non_images() {
    let ctx = TestContext::new();
    let citizen = ctx.seed_user("citizen", Role::User).await;

    for (filename, file_type) in [
        ("report.pdf", "application/pdf"),
        ("photo.gif", "image/gif"),
        ("photo.png", "image/jpeg"),
        ("../../etc/passwd", "image/png"),
    ] {
        let response = create_router(ctx.state.clone())
            .oneshot(presign_request(&citizen.id.to_string(), filename, file_type))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{filename}");
    }
}

#[tokio::test]
async fn test_presigned_url_requires_authentication() {
    let ctx = TestContext::new();

    let response = create_router(ctx.state.clone())
        .oneshot(presign_request("not-a-uuid", "a.png", "image/png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_presigned_url_storage_failure() {
    let ctx = TestContext::with(MockStorageService::new_failing(), MockNotifier::new());
    let citizen = ctx.seed_user("citizen", Role::User).await;

    let response = create_router(ctx.state.clone())
        .oneshot(presign_request(&citizen.id.to_string(), "a.png", "image/png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
