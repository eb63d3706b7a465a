//! Error taxonomy for the account subscription resource
//!
//! Every variant renders as `"<action> QuickSight Account Subscription (<id>): <cause>"`
//! so diagnostics read the same regardless of which step failed.

use provider::{EmptyResultError, NotFoundError, WaitError};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lookup failures. Both `NotFound` and `EmptyResult` mean the subscription
/// is gone.
#[derive(Debug, thiserror::Error)]
pub enum FindError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    EmptyResult(#[from] EmptyResultError),

    #[error(transparent)]
    Api(#[from] quicksight_api::Error),
}

impl FindError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FindError::NotFound(_) | FindError::EmptyResult(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("creating QuickSight Account Subscription ({id}): {source}")]
    Create { id: String, source: BoxError },

    #[error("reading QuickSight Account Subscription ({id}): {source}")]
    Read { id: String, source: FindError },

    #[error("deleting QuickSight Account Subscription ({id}): {source}")]
    Delete {
        id: String,
        source: quicksight_api::Error,
    },

    #[error("waiting for creation QuickSight Account Subscription ({id}): {source}")]
    WaitForCreation {
        id: String,
        source: WaitError<FindError>,
    },

    #[error("waiting for delete QuickSight Account Subscription ({id}): {source}")]
    WaitForDeletion {
        id: String,
        source: WaitError<FindError>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
