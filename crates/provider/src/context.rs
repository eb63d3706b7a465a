//! Ambient operation context

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-invocation context handed to every resource operation.
///
/// Cancelling the token aborts any wait loop the operation is running.
#[derive(Debug, Clone)]
pub struct Context {
    request_id: String,
    cancel: CancellationToken,
}

impl Context {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            request_id: format!("op_{}", Uuid::new_v4().as_simple()),
            cancel,
        }
    }

    /// A context whose cancellation is tied to `parent`.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self::new(parent.child_token())
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
