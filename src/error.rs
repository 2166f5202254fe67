use axum::{
    Json,
    extract::{
        Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{models::ComplaintStatus, repository::RepositoryError};

const INTERNAL_MESSAGE: &str = "Internal server error";

/// AppError
///
/// The error taxonomy shared by every operation. Handlers return it directly;
/// `IntoResponse` maps each variant to its HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("authentication required")]
    Unauthenticated,
    #[error("complaint is already {0} and cannot advance further")]
    InvalidTransition(ComplaintStatus),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Internal(err.to_string())
    }
}

// Extractor rejections are caller mistakes: unreadable input is a validation
// failure and keeps the `{message}` envelope.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected request body");
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected path parameter");
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected query string");
        AppError::Validation(rejection.body_text())
    }
}

/// ErrorBody
///
/// JSON envelope for every error response. `errorStack` is only populated by
/// `expose_error_detail`, which is installed in Local deployments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "errorStack", skip_serializing_if = "Option::is_none", default)]
    pub error_stack: Option<String>,
}

/// Diagnostic detail of an internal failure, carried in response extensions.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::Internal(detail) = self {
            tracing::error!(%detail, "request failed");
            let body = ErrorBody {
                message: INTERNAL_MESSAGE.to_string(),
                error_stack: None,
            };
            let mut response = (status, Json(body)).into_response();
            response.extensions_mut().insert(ErrorDetail(detail));
            return response;
        }

        let body = ErrorBody {
            message: self.to_string(),
            error_stack: None,
        };
        (status, Json(body)).into_response()
    }
}

/// expose_error_detail
///
/// Middleware for non-production deployments: rewrites internal error responses
/// so the diagnostic detail reaches the developer.
pub async fn expose_error_detail(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    match response.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail(detail)) => {
            let body = ErrorBody {
                message: INTERNAL_MESSAGE.to_string(),
                error_stack: Some(detail),
            };
            (response.status(), Json(body)).into_response()
        }
        None => response,
    }
}
