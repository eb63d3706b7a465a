//! Subscription lookup

use provider::{EmptyResultError, NotFoundError};
use quicksight_api::{AccountInfo, DescribeAccountSubscriptionInput, QuickSightApi};

use crate::error::FindError;

/// Describe the subscription owned by `id` (an account id).
///
/// A `ResourceNotFoundException` becomes `NotFoundError` and a response
/// without `AccountInfo` becomes `EmptyResultError`, both carrying the
/// request. Anything else passes through as `FindError::Api`.
pub async fn find_account_subscription_by_id(
    conn: &dyn QuickSightApi,
    id: &str,
) -> Result<AccountInfo, FindError> {
    let input = DescribeAccountSubscriptionInput {
        aws_account_id: id.to_owned(),
    };

    let output = match conn.describe_account_subscription(&input).await {
        Ok(output) => output,
        Err(err) if err.is_resource_not_found() => {
            return Err(NotFoundError::new(err).with_request(&input).into());
        }
        Err(err) => return Err(err.into()),
    };

    output
        .account_info
        .ok_or_else(|| EmptyResultError::new(&input).into())
}
