//! HTTP surface: the local REST API under `/api/deals` and the reconciled
//! pipeline API under `/api/pipeline`.

pub mod local;
pub mod pipeline;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};

use crate::error::{ApiError, DealError};
use crate::state::AppState;

/// Full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(local::routes())
        .merge(pipeline::routes())
        .with_state(state)
}

impl DealError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Validation: 400 Bad Request
    /// - NotFound: 404 Not Found
    /// - RemoteUnavailable: 502 Bad Gateway
    /// - Storage: 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DealError::Validation(_) => StatusCode::BAD_REQUEST,
            DealError::NotFound(_) => StatusCode::NOT_FOUND,
            DealError::RemoteUnavailable(_) => StatusCode::BAD_GATEWAY,
            DealError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DealError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        (status, Json(ApiError::from(&self))).into_response()
    }
}

impl From<JsonRejection> for DealError {
    fn from(rejection: JsonRejection) -> Self {
        DealError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for DealError {
    fn from(_: PathRejection) -> Self {
        DealError::Validation("Invalid deal ID".into())
    }
}
