//! Plugin contract between the provider host and its resources
//!
//! A resource declares a `Schema` and implements create/read/delete against
//! a `ResourceData`. Operations report problems as `Diagnostics` rather than
//! returning errors, so partial results (e.g. a created id plus a failed
//! read-back) reach the host intact.
//!
//! The host owns everything around the resource: it hands each operation a
//! `Context` (request id + cancellation) and the provider-wide meta object
//! `M` (API clients, ambient account), then persists whatever id and
//! attributes the operation leaves behind.

pub mod context;
pub mod data;
pub mod diag;
pub mod errors;
pub mod retry;
pub mod schema;
pub mod timeouts;

pub use context::Context;
pub use data::ResourceData;
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use errors::{EmptyResultError, NotFoundError};
pub use retry::{StateChangeConf, StateRefresh, WaitError};
pub use schema::{Attribute, AttributeType, Schema};
pub use timeouts::{Operation, TimeoutOverrides, Timeouts};

use std::future::Future;
use std::pin::Pin;

/// A managed resource type.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Resource<M>>` in the host registry).
pub trait Resource<M>: Send + Sync {
    /// Type name as used in configuration, e.g. `aws_quicksight_account_subscription`.
    fn type_name(&self) -> &str;

    fn schema(&self) -> &Schema;

    /// Create the remote object. On success the data must carry the new id.
    fn create<'a>(
        &'a self,
        ctx: &'a Context,
        meta: &'a M,
        data: &'a mut ResourceData,
    ) -> Pin<Box<dyn Future<Output = Diagnostics> + Send + 'a>>;

    /// Refresh the data from the remote object. Clearing the id signals that
    /// the object no longer exists.
    fn read<'a>(
        &'a self,
        ctx: &'a Context,
        meta: &'a M,
        data: &'a mut ResourceData,
    ) -> Pin<Box<dyn Future<Output = Diagnostics> + Send + 'a>>;

    fn delete<'a>(
        &'a self,
        ctx: &'a Context,
        meta: &'a M,
        data: &'a mut ResourceData,
    ) -> Pin<Box<dyn Future<Output = Diagnostics> + Send + 'a>>;

    /// Validate a configuration without touching the remote side.
    fn validate(&self, config: &serde_json::Map<String, serde_json::Value>) -> Diagnostics {
        self.schema().validate(config)
    }
}
