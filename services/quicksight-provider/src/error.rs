//! Host API errors
//!
//! Resource operations never fail at the HTTP level: their problems travel
//! as diagnostics in a 200 response. These errors cover requests the host
//! cannot dispatch at all.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("unknown resource type \"{0}\"")]
    UnknownResourceType(String),

    #[error("unknown operation \"{0}\"")]
    UnknownOperation(String),

    #[error("invalid request body: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownResourceType(_) | ApiError::UnknownOperation(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::UnknownResourceType(_) => "unknown_resource_type",
            ApiError::UnknownOperation(_) => "unknown_operation",
            ApiError::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// JSON error body: {"error":{"type":"...","message":"...","request_id":"req_..."}}
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        let body = serde_json::json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
                "request_id": request_id,
            }
        });
        (
            self.status(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
