//! Provider-wide meta object handed to every operation

use std::fmt;
use std::sync::Arc;

use quicksight_api::QuickSightApi;

/// Ambient account plus the shared control-plane client.
#[derive(Clone)]
pub struct AwsClient {
    account_id: String,
    region: String,
    quicksight: Arc<dyn QuickSightApi>,
}

impl AwsClient {
    pub fn new(
        account_id: impl Into<String>,
        region: impl Into<String>,
        quicksight: Arc<dyn QuickSightApi>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            quicksight,
        }
    }

    /// Account the provider is operating in; the default owner of new
    /// subscriptions.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn quicksight_client(&self) -> &dyn QuickSightApi {
        self.quicksight.as_ref()
    }
}

impl fmt::Debug for AwsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsClient")
            .field("account_id", &self.account_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
