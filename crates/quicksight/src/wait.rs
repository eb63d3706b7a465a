//! Waiters for the subscription status state machine

use std::time::Duration;

use provider::{StateChangeConf, WaitError};
use quicksight_api::{AccountInfo, QuickSightApi};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::FindError;
use crate::status::{
    AccountSubscriptionStatus, STATUS_CREATED, STATUS_OK, STATUS_SIGNUP_ATTEMPT_IN_PROGRESS,
    STATUS_UNSUBSCRIBE_IN_PROGRESS, STATUS_UNSUBSCRIBED,
};

/// Signup can take a while to become visible to describe calls.
const CREATE_NOT_FOUND_CHECKS: u32 = 20;
const CREATE_CONTINUOUS_TARGET_OCCURRENCE: u32 = 2;

fn created_conf(timeout: Duration) -> StateChangeConf {
    StateChangeConf::new(
        [STATUS_SIGNUP_ATTEMPT_IN_PROGRESS],
        [STATUS_CREATED, STATUS_OK],
        timeout,
    )
    .not_found_checks(CREATE_NOT_FOUND_CHECKS)
    .continuous_target_occurrence(CREATE_CONTINUOUS_TARGET_OCCURRENCE)
}

fn deleted_conf(timeout: Duration) -> StateChangeConf {
    StateChangeConf::new(
        [STATUS_CREATED, STATUS_OK, STATUS_UNSUBSCRIBE_IN_PROGRESS],
        [STATUS_UNSUBSCRIBED],
        timeout,
    )
}

/// Wait until the subscription reports `ACCOUNT_CREATED` or `OK` twice in a
/// row, tolerating up to 20 consecutive not-found lookups.
pub async fn wait_account_subscription_created(
    conn: &dyn QuickSightApi,
    id: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Option<AccountInfo>, WaitError<FindError>> {
    debug!(account_id = id, ?timeout, "waiting for subscription creation");
    created_conf(timeout)
        .wait_for_state(&AccountSubscriptionStatus::new(conn, id), cancel)
        .await
}

/// Wait until the subscription reports `UNSUBSCRIBED`. A not-found lookup
/// fails the wait.
pub async fn wait_account_subscription_deleted(
    conn: &dyn QuickSightApi,
    id: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Option<AccountInfo>, WaitError<FindError>> {
    debug!(account_id = id, ?timeout, "waiting for subscription deletion");
    deleted_conf(timeout)
        .wait_for_state(&AccountSubscriptionStatus::new(conn, id), cancel)
        .await
}
