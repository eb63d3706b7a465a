//! Errors from control-plane calls

use crate::constants::RESOURCE_NOT_FOUND;

/// Errors from control-plane calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("{code}: {message} (HTTP {status}{})", request_id_suffix(.request_id.as_deref()))]
    Service {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Whether the service reported that the addressed object does not exist.
    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, Error::Service { code, .. } if code == RESOURCE_NOT_FOUND)
    }

    /// Fault code for service errors.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

fn request_id_suffix(request_id: Option<&str>) -> String {
    request_id
        .map(|id| format!(", request id {id}"))
        .unwrap_or_default()
}

/// Result alias for control-plane calls.
pub type Result<T> = std::result::Result<T, Error>;
