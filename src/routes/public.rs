use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /users/register
        .route("/users/register", post(handlers::register_user))
        // POST /users/login
        // Returns `{accessToken}` for the bearer header.
        .route("/users/login", post(handlers::login))
        // GET /gov-web-data, GET /gov-web-data/{id}
        .route("/gov-web-data", get(handlers::list_gov_web_data))
        .route("/gov-web-data/{id}", get(handlers::get_gov_web_data))
}
