use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{patch, post},
};

/// Admin Router Module
///
/// Government web directory management. Nested under `/admin`; each handler
/// resolves the caller through `AuthUser` and the directory service rejects
/// non-administrators with 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/gov-web-data
        .route("/gov-web-data", post(handlers::add_gov_web_data))
        // PATCH/DELETE /admin/gov-web-data/{id}
        .route(
            "/gov-web-data/{id}",
            patch(handlers::edit_gov_web_data).delete(handlers::delete_gov_web_data),
        )
}
