//! Subscription status values and the polling adapter

use std::future::Future;
use std::pin::Pin;

use provider::StateRefresh;
use quicksight_api::{AccountInfo, QuickSightApi};

use crate::error::FindError;
use crate::find::find_account_subscription_by_id;

// The service does not document these; they are what it reports.
pub const STATUS_CREATED: &str = "ACCOUNT_CREATED";
pub const STATUS_OK: &str = "OK";
pub const STATUS_SIGNUP_ATTEMPT_IN_PROGRESS: &str = "SIGNUP_ATTEMPT_IN_PROGRESS";
pub const STATUS_UNSUBSCRIBE_IN_PROGRESS: &str = "UNSUBSCRIBE_IN_PROGRESS";
pub const STATUS_UNSUBSCRIBED: &str = "UNSUBSCRIBED";

/// Polls the subscription of one account. Lookup not-found and empty
/// results count as "not there".
pub struct AccountSubscriptionStatus<'a> {
    conn: &'a dyn QuickSightApi,
    id: &'a str,
}

impl<'a> AccountSubscriptionStatus<'a> {
    pub fn new(conn: &'a dyn QuickSightApi, id: &'a str) -> Self {
        Self { conn, id }
    }
}

impl StateRefresh for AccountSubscriptionStatus<'_> {
    type Output = AccountInfo;
    type Error = FindError;

    fn fetch_status(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<(AccountInfo, String), FindError>> + Send + '_>> {
        Box::pin(async move {
            let info = find_account_subscription_by_id(self.conn, self.id).await?;
            let status = info.account_subscription_status.clone().unwrap_or_default();
            Ok((info, status))
        })
    }

    fn is_not_found(&self, error: &FindError) -> bool {
        error.is_not_found()
    }
}
