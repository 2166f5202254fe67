use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain rules.
pub mod access;
pub mod complaints;
pub mod directory;
pub mod lifecycle;
pub mod validation;

// Infrastructure and HTTP plumbing.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod pagination;
pub mod repository;
pub mod storage;

pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::{AppConfig, Env};
pub use error::AppError;
pub use notifier::{HttpMailRelay, MockNotifier, NotifierState};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers and the
/// `ToSchema` models. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login, handlers::get_profile,
        handlers::get_presigned_url,
        handlers::create_complaint, handlers::list_complaints, handlers::get_complaint,
        handlers::update_complaint, handlers::update_complaint_status, handlers::delete_complaint,
        handlers::list_gov_web_data, handlers::get_gov_web_data, handlers::add_gov_web_data,
        handlers::edit_gov_web_data, handlers::delete_gov_web_data
    ),
    components(
        schemas(
            models::Role, models::ComplaintStatus, models::Complaint,
            models::CreateComplaintRequest, models::UpdateComplaintRequest, models::ComplaintList,
            models::ComplaintListResponse, pagination::Page<models::Complaint>,
            models::GovWebData, models::GovWebDataList, models::CreateGovWebDataRequest,
            models::UpdateGovWebDataRequest, models::RegisterUserRequest, models::LoginRequest,
            models::TokenResponse, models::UserProfile, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::MessageResponse, models::CreatedResponse,
            models::StatusUpdateResponse, error::ErrorBody,
        )
    ),
    tags(
        (name = "egov-portal", description = "Citizen complaints and government web directory API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container of services shared by every request.
#[derive(Clone)]
pub struct AppState {
    /// Credential Store, Complaint Store and directory persistence.
    pub repo: RepositoryState,
    /// Asset Store for complaint images.
    pub storage: StorageState,
    /// Owner notifications on status changes.
    pub notifier: NotifierState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for NotifierState {
    fn from_ref(app_state: &AppState) -> NotifierState {
        app_state.notifier.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`: extracting `AuthUser` rejects the request
/// with 401 before any handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routers, the middleware stack and the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let env = state.config.env;

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Role checks for these happen in the handlers.
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    // Internal error detail is only ever rendered outside production.
    let base_router = match env {
        Env::Local => base_router.layer(middleware::from_fn(error::expose_error_detail)),
        Env::Production => base_router,
    };

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the `http_request` span so every log line of a request carries its
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
