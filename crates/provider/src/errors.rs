//! Absence errors shared by resource finders
//!
//! Finders turn a remote "does not exist" fault into `NotFoundError` and a
//! structurally empty success response into `EmptyResultError`. Callers treat
//! both as "the object is gone" when deciding whether to drop it from state.

use serde::Serialize;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The remote object does not exist.
///
/// Carries the originating fault and the request that produced it so the
/// diagnostic can show what was asked for.
#[derive(Debug, thiserror::Error)]
#[error("couldn't find resource{}", last_request_suffix(.last_request.as_ref()))]
pub struct NotFoundError {
    #[source]
    pub last_error: Option<BoxError>,
    pub last_request: Option<serde_json::Value>,
}

impl NotFoundError {
    pub fn new(last_error: impl Into<BoxError>) -> Self {
        Self {
            last_error: Some(last_error.into()),
            last_request: None,
        }
    }

    /// Attach the request that produced the fault. Serialization failures
    /// leave the request unset rather than masking the not-found.
    pub fn with_request<R: Serialize>(mut self, request: &R) -> Self {
        self.last_request = serde_json::to_value(request).ok();
        self
    }
}

/// The remote call succeeded but returned no payload.
#[derive(Debug, thiserror::Error)]
#[error("empty result{}", last_request_suffix(.last_request.as_ref()))]
pub struct EmptyResultError {
    pub last_request: Option<serde_json::Value>,
}

impl EmptyResultError {
    pub fn new<R: Serialize>(request: &R) -> Self {
        Self {
            last_request: serde_json::to_value(request).ok(),
        }
    }
}

fn last_request_suffix(request: Option<&serde_json::Value>) -> String {
    match request {
        Some(r) => format!(" (request: {r})"),
        None => String::new(),
    }
}
