//! QuickSight resources
//!
//! Currently one resource, `aws_quicksight_account_subscription`. Handlers
//! receive an `AwsClient` meta object carrying the ambient account id and the
//! shared control-plane client.

pub mod account_subscription;
pub mod conns;
pub mod error;
pub mod find;
pub mod status;
pub mod wait;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use provider::Resource;

pub use account_subscription::AccountSubscription;
pub use conns::AwsClient;
pub use error::{Error, FindError, Result};
pub use find::find_account_subscription_by_id;
pub use wait::{wait_account_subscription_created, wait_account_subscription_deleted};

/// Every resource this crate provides, for registration with a host.
pub fn resources() -> Vec<Arc<dyn Resource<AwsClient>>> {
    vec![Arc::new(AccountSubscription::new())]
}
