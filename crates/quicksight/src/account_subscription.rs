//! `aws_quicksight_account_subscription` resource
//!
//! Subscribes an account to QuickSight. The owning account id is the
//! resource id. There is no update: every argument forces replacement, and
//! removal unsubscribes the account and waits for `UNSUBSCRIBED`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use provider::{
    Attribute, Context, Diagnostic, Diagnostics, Operation, Resource, ResourceData, Schema,
    Timeouts,
};
use quicksight_api::{
    AuthenticationMethodOption, CreateAccountSubscriptionInput, DeleteAccountSubscriptionInput,
    Edition,
};
use tracing::{info, warn};

use crate::conns::AwsClient;
use crate::error::Error;
use crate::find::find_account_subscription_by_id;
use crate::status::STATUS_UNSUBSCRIBED;
use crate::wait::{wait_account_subscription_created, wait_account_subscription_deleted};

pub const TYPE_NAME: &str = "aws_quicksight_account_subscription";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub const ATTR_ACCOUNT_NAME: &str = "account_name";
pub const ATTR_ACCOUNT_SUBSCRIPTION_STATUS: &str = "account_subscription_status";
pub const ATTR_ACTIVE_DIRECTORY_NAME: &str = "active_directory_name";
pub const ATTR_ADMIN_GROUP: &str = "admin_group";
pub const ATTR_AUTHENTICATION_METHOD: &str = "authentication_method";
pub const ATTR_AUTHOR_GROUP: &str = "author_group";
pub const ATTR_AWS_ACCOUNT_ID: &str = "aws_account_id";
pub const ATTR_CONTACT_NUMBER: &str = "contact_number";
pub const ATTR_DIRECTORY_ID: &str = "directory_id";
pub const ATTR_EDITION: &str = "edition";
pub const ATTR_EMAIL_ADDRESS: &str = "email_address";
pub const ATTR_FIRST_NAME: &str = "first_name";
pub const ATTR_IAM_IDENTITY_CENTER_INSTANCE_ARN: &str = "iam_identity_center_instance_arn";
pub const ATTR_LAST_NAME: &str = "last_name";
pub const ATTR_NOTIFICATION_EMAIL: &str = "notification_email";
pub const ATTR_READER_GROUP: &str = "reader_group";
pub const ATTR_REALM: &str = "realm";

/// Account ids are exactly 12 decimal digits.
pub fn validate_account_id(value: &str) -> Result<(), String> {
    if value.len() == 12 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(format!("{value:?} is not a valid account ID (12 digits)"))
    }
}

fn schema() -> Schema {
    Schema::new(Timeouts::uniform(DEFAULT_TIMEOUT))
        .with_attribute(ATTR_ACCOUNT_NAME, Attribute::required_string().force_new())
        .with_attribute(ATTR_ACCOUNT_SUBSCRIPTION_STATUS, Attribute::computed_string())
        .with_attribute(
            ATTR_ACTIVE_DIRECTORY_NAME,
            Attribute::optional_string().force_new(),
        )
        .with_attribute(
            ATTR_ADMIN_GROUP,
            Attribute::optional_string_list().min_items(1).force_new(),
        )
        .with_attribute(
            ATTR_AUTHENTICATION_METHOD,
            Attribute::required_string()
                .one_of(AuthenticationMethodOption::VALUES)
                .force_new(),
        )
        .with_attribute(
            ATTR_AUTHOR_GROUP,
            Attribute::optional_string_list().min_items(1).force_new(),
        )
        .with_attribute(
            ATTR_AWS_ACCOUNT_ID,
            Attribute::optional_string()
                .computed()
                .validate_with(validate_account_id)
                .force_new(),
        )
        .with_attribute(ATTR_CONTACT_NUMBER, Attribute::optional_string().force_new())
        .with_attribute(ATTR_DIRECTORY_ID, Attribute::optional_string().force_new())
        .with_attribute(
            ATTR_EDITION,
            Attribute::required_string()
                .one_of(Edition::VALUES)
                .force_new(),
        )
        .with_attribute(ATTR_EMAIL_ADDRESS, Attribute::optional_string().force_new())
        .with_attribute(ATTR_FIRST_NAME, Attribute::optional_string().force_new())
        .with_attribute(
            ATTR_IAM_IDENTITY_CENTER_INSTANCE_ARN,
            Attribute::optional_string().force_new(),
        )
        .with_attribute(ATTR_LAST_NAME, Attribute::optional_string().force_new())
        .with_attribute(
            ATTR_NOTIFICATION_EMAIL,
            Attribute::required_string().force_new(),
        )
        .with_attribute(
            ATTR_READER_GROUP,
            Attribute::optional_string_list().min_items(1).force_new(),
        )
        .with_attribute(ATTR_REALM, Attribute::optional_string().force_new())
}

pub struct AccountSubscription {
    schema: Schema,
}

impl AccountSubscription {
    pub fn new() -> Self {
        Self { schema: schema() }
    }
}

impl Default for AccountSubscription {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the create request. Optional members are only set when present and
/// non-empty in the configuration.
fn expand_create_input(
    account_id: &str,
    data: &ResourceData,
) -> Result<CreateAccountSubscriptionInput, quicksight_api::UnknownVariant> {
    let authentication_method = data.get_str(ATTR_AUTHENTICATION_METHOD).parse()?;
    let edition = data.get_str(ATTR_EDITION).parse()?;
    let owned = |key: &str| data.get_ok_str(key).map(str::to_owned);

    let mut input = CreateAccountSubscriptionInput::new(
        account_id,
        data.get_str(ATTR_ACCOUNT_NAME),
        authentication_method,
        edition,
        data.get_str(ATTR_NOTIFICATION_EMAIL),
    );
    input.active_directory_name = owned(ATTR_ACTIVE_DIRECTORY_NAME);
    input.admin_group = data.get_ok_strings(ATTR_ADMIN_GROUP);
    input.author_group = data.get_ok_strings(ATTR_AUTHOR_GROUP);
    input.reader_group = data.get_ok_strings(ATTR_READER_GROUP);
    input.contact_number = owned(ATTR_CONTACT_NUMBER);
    input.directory_id = owned(ATTR_DIRECTORY_ID);
    input.email_address = owned(ATTR_EMAIL_ADDRESS);
    input.first_name = owned(ATTR_FIRST_NAME);
    input.iam_identity_center_instance_arn = owned(ATTR_IAM_IDENTITY_CENTER_INSTANCE_ARN);
    input.last_name = owned(ATTR_LAST_NAME);
    input.realm = owned(ATTR_REALM);
    Ok(input)
}

fn push(diags: &mut Diagnostics, err: Error) {
    diags.push(Diagnostic::error(err.to_string()));
}

impl AccountSubscription {
    async fn create_subscription(
        &self,
        ctx: &Context,
        meta: &AwsClient,
        data: &mut ResourceData,
    ) -> Diagnostics {
        let mut diags = self.schema.validate(data.attributes());
        if diags.has_error() {
            return diags;
        }

        let conn = meta.quicksight_client();
        let account_id = data
            .get_ok_str(ATTR_AWS_ACCOUNT_ID)
            .unwrap_or(meta.account_id())
            .to_owned();
        let account_name = data.get_str(ATTR_ACCOUNT_NAME).to_owned();

        let input = match expand_create_input(&account_id, data) {
            Ok(input) => input,
            Err(err) => {
                push(
                    &mut diags,
                    Error::Create {
                        id: account_name,
                        source: err.into(),
                    },
                );
                return diags;
            }
        };

        info!(
            request_id = ctx.request_id(),
            account_id = %account_id,
            edition = %input.edition,
            "creating QuickSight account subscription"
        );

        let output = match conn.create_account_subscription(&input).await {
            Ok(output) => output,
            Err(err) => {
                push(
                    &mut diags,
                    Error::Create {
                        id: account_name,
                        source: err.into(),
                    },
                );
                return diags;
            }
        };
        if output.signup_response.is_none() {
            push(
                &mut diags,
                Error::Create {
                    id: account_name,
                    source: "empty output".into(),
                },
            );
            return diags;
        }

        data.set_id(account_id.as_str());
        data.set(ATTR_AWS_ACCOUNT_ID, account_id.as_str());
        data.mark_new_resource();

        if let Err(err) = wait_account_subscription_created(
            conn,
            &account_id,
            data.timeout(Operation::Create),
            ctx.cancellation(),
        )
        .await
        {
            push(
                &mut diags,
                Error::WaitForCreation {
                    id: account_id,
                    source: err,
                },
            );
            return diags;
        }

        diags.extend(self.read_subscription(ctx, meta, data).await);
        diags
    }

    async fn read_subscription(
        &self,
        ctx: &Context,
        meta: &AwsClient,
        data: &mut ResourceData,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let id = data.id_or_empty().to_owned();

        let info = match find_account_subscription_by_id(meta.quicksight_client(), &id).await {
            Ok(info) => info,
            Err(err) if !data.is_new_resource() && err.is_not_found() => {
                warn!(
                    request_id = ctx.request_id(),
                    account_id = %id,
                    error = %err,
                    "QuickSight account subscription not found, removing from state"
                );
                data.clear_id();
                return diags;
            }
            Err(err) => {
                push(&mut diags, Error::Read { id, source: err });
                return diags;
            }
        };

        let status = info.account_subscription_status.as_deref().unwrap_or_default();
        if !data.is_new_resource() && status == STATUS_UNSUBSCRIBED {
            warn!(
                request_id = ctx.request_id(),
                account_id = %id,
                status,
                "QuickSight account subscription unsubscribed, removing from state"
            );
            data.clear_id();
            return diags;
        }

        data.set_if_some(ATTR_ACCOUNT_NAME, info.account_name);
        data.set_if_some(ATTR_EDITION, info.edition);
        data.set_if_some(ATTR_NOTIFICATION_EMAIL, info.notification_email);
        data.set_if_some(
            ATTR_ACCOUNT_SUBSCRIPTION_STATUS,
            info.account_subscription_status,
        );
        data.set_if_some(
            ATTR_IAM_IDENTITY_CENTER_INSTANCE_ARN,
            info.iam_identity_center_instance_arn,
        );
        diags
    }

    async fn delete_subscription(
        &self,
        ctx: &Context,
        meta: &AwsClient,
        data: &mut ResourceData,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let conn = meta.quicksight_client();
        let id = data.id_or_empty().to_owned();

        info!(
            request_id = ctx.request_id(),
            account_id = %id,
            "deleting QuickSight account subscription"
        );

        let input = DeleteAccountSubscriptionInput {
            aws_account_id: id.clone(),
        };
        match conn.delete_account_subscription(&input).await {
            Ok(_) => {}
            Err(err) if err.is_resource_not_found() => return diags,
            Err(err) => {
                push(&mut diags, Error::Delete { id, source: err });
                return diags;
            }
        }

        if let Err(err) = wait_account_subscription_deleted(
            conn,
            &id,
            data.timeout(Operation::Delete),
            ctx.cancellation(),
        )
        .await
        {
            push(&mut diags, Error::WaitForDeletion { id, source: err });
        }
        diags
    }
}

impl Resource<AwsClient> for AccountSubscription {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create<'a>(
        &'a self,
        ctx: &'a Context,
        meta: &'a AwsClient,
        data: &'a mut ResourceData,
    ) -> Pin<Box<dyn Future<Output = Diagnostics> + Send + 'a>> {
        Box::pin(self.create_subscription(ctx, meta, data))
    }

    fn read<'a>(
        &'a self,
        ctx: &'a Context,
        meta: &'a AwsClient,
        data: &'a mut ResourceData,
    ) -> Pin<Box<dyn Future<Output = Diagnostics> + Send + 'a>> {
        Box::pin(self.read_subscription(ctx, meta, data))
    }

    fn delete<'a>(
        &'a self,
        ctx: &'a Context,
        meta: &'a AwsClient,
        data: &'a mut ResourceData,
    ) -> Pin<Box<dyn Future<Output = Diagnostics> + Send + 'a>> {
        Box::pin(self.delete_subscription(ctx, meta, data))
    }
}
