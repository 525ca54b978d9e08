//! Service and API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use isoview_store::StoreError;
use serde::Serialize;

/// Errors raised by the search and retrieval services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("gene not found: {0}")]
    GeneNotFound(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("all data retrieval methods failed: joined query: {joined}; direct query: {fallback}")]
    Retrieval { joined: String, fallback: String },

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownTable(table) => ServiceError::UnknownTable(table),
            other => ServiceError::Store(other),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("core error: {0}")]
    Core(#[from] isoview_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Service(e) => match e {
                ServiceError::GeneNotFound(_) => "gene_not_found",
                ServiceError::UnknownTable(_) => "unknown_table",
                ServiceError::Retrieval { .. } => "retrieval_failed",
                ServiceError::Store(_) => "store_error",
            },
            Self::Store(e) => match e {
                StoreError::UnknownTable(_) => "unknown_table",
                StoreError::NotFound(_) => "not_found",
                _ => "store_error",
            },
            Self::Core(_) => "core_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Service(e) => match e {
                ServiceError::GeneNotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::UnknownTable(_) => StatusCode::BAD_REQUEST,
                ServiceError::Retrieval { .. } => StatusCode::BAD_GATEWAY,
                ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(e) => match e {
                StoreError::UnknownTable(_) => StatusCode::BAD_REQUEST,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Core(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
