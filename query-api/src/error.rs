//! HTTP-facing error type. Most of the response contract's error tags
//! (`parse_error`, `invalid_entry_point`, `unsupported_query`,
//! `no_entry_point`, `no_path_found`) never reach this type — they are
//! carried inside a successful `QueryResponse`'s `error` field (spec §6: "no
//! 500-style bubbling from the core"). `ApiError` exists for the two things
//! that genuinely are HTTP-layer failures: a malformed request body, and a
//! collaborator/deadline failure propagated out of the core as `Err`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use query_core::QueryError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("collaborator failure: {0}")]
    Collaborator(String),

    #[error("query deadline exceeded")]
    DeadlineExceeded,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Collaborator(_) => StatusCode::BAD_GATEWAY,
            ApiError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Collaborator(_) => "COLLABORATOR_ERROR",
            ApiError::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }
}

/// `driver::run` only ever returns `Err` for these two variants (every other
/// `QueryError` is caught earlier and folded into `QueryResponse.error`).
impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::DeadlineExceeded => ApiError::DeadlineExceeded,
            QueryError::Collaborator(msg) => ApiError::Collaborator(msg),
            other => ApiError::Collaborator(other.to_string()),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body: ApiResponse<()> = ApiResponse::error(self.error_code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
