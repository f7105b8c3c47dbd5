//! API error responses
//!
//! Every error body is `{"message": ...}`. Internal failures are logged with
//! detail and reported to clients generically.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// Write against a read-only store
    MethodNotAllowed(String),
    /// Request the extractors could not accept, with axum's status
    Rejected(StatusCode, String),
    Internal(String),
}

impl ApiError {
    pub fn form_not_found(contract_number: &str) -> Self {
        ApiError::NotFound(format!(
            "Blind check form with case ID '{}' not found.",
            contract_number
        ))
    }

    pub fn marker_not_found(contract_number: &str, x: i32, y: i32) -> Self {
        ApiError::NotFound(format!(
            "No marker at ({}, {}) on contract '{}'",
            x, y, contract_number
        ))
    }
}

impl From<bc_common::Error> for ApiError {
    fn from(err: bc_common::Error) -> Self {
        use bc_common::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::ReadOnly(msg) => ApiError::MethodNotAllowed(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    ApiError::Rejected(rejection.status(), rejection.body_text())
                }
            }
        )*
    };
}

impl_from_rejection!(JsonRejection, PathRejection, QueryRejection);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            ApiError::Rejected(status, msg) => (status, msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
