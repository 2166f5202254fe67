use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind the auth middleware, so handlers always receive
/// a resolved `AuthUser`. Ownership and role checks happen in the complaint
/// service through the access policy.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users/profile
        .route("/users/profile", get(handlers::get_profile))
        // POST /upload/presigned
        // Short-lived (10-minute) URL for uploading a complaint image directly
        // to the Asset Store.
        .route("/upload/presigned", post(handlers::get_presigned_url))
        // POST/GET /complaints
        .route(
            "/complaints",
            post(handlers::create_complaint).get(handlers::list_complaints),
        )
        // GET/PATCH/DELETE /complaints/{id}
        .route(
            "/complaints/{id}",
            get(handlers::get_complaint)
                .patch(handlers::update_complaint)
                .delete(handlers::delete_complaint),
        )
        // PATCH /complaints/{id}/status
        // Admin only: one step along pending → in-process → resolved.
        .route(
            "/complaints/{id}/status",
            patch(handlers::update_complaint_status),
        )
}
