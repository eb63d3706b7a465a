//! Request and response shapes for the account subscription operations
//!
//! Member names follow the service's PascalCase JSON protocol. Optional
//! members are skipped when `None` so absent inputs never reach the wire as
//! empty strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error for enum values the service does not define.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:?}, expected one of [{}]", .allowed.join(", "))]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub allowed: &'static [&'static str],
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_owned(),
                        allowed: Self::VALUES,
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// How users of the subscription authenticate.
    AuthenticationMethodOption, "authentication method", {
        IamAndQuicksight => "IAM_AND_QUICKSIGHT",
        IamOnly => "IAM_ONLY",
        ActiveDirectory => "ACTIVE_DIRECTORY",
        IamIdentityCenter => "IAM_IDENTITY_CENTER",
    }
);

string_enum!(
    /// Service tier.
    Edition, "edition", {
        Standard => "STANDARD",
        Enterprise => "ENTERPRISE",
        EnterpriseAndQ => "ENTERPRISE_AND_Q",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAccountSubscriptionInput {
    /// Path parameter; the client strips it from the JSON body.
    pub aws_account_id: String,
    pub account_name: String,
    pub authentication_method: AuthenticationMethodOption,
    pub edition: Edition,
    pub notification_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_directory_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_group: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_group: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(
        rename = "IAMIdentityCenterInstanceArn",
        skip_serializing_if = "Option::is_none"
    )]
    pub iam_identity_center_instance_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reader_group: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
}

impl CreateAccountSubscriptionInput {
    /// Input with only the required members set.
    pub fn new(
        aws_account_id: impl Into<String>,
        account_name: impl Into<String>,
        authentication_method: AuthenticationMethodOption,
        edition: Edition,
        notification_email: impl Into<String>,
    ) -> Self {
        Self {
            aws_account_id: aws_account_id.into(),
            account_name: account_name.into(),
            authentication_method,
            edition,
            notification_email: notification_email.into(),
            active_directory_name: None,
            admin_group: None,
            author_group: None,
            contact_number: None,
            directory_id: None,
            email_address: None,
            first_name: None,
            iam_identity_center_instance_arn: None,
            last_name: None,
            reader_group: None,
            realm: None,
        }
    }
}

/// Result of a signup attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignupResponse {
    #[serde(rename = "IAMUser", default)]
    pub iam_user: bool,
    #[serde(rename = "userLoginName", default)]
    pub user_login_name: Option<String>,
    #[serde(rename = "accountName", default)]
    pub account_name: Option<String>,
    #[serde(rename = "directoryType", default)]
    pub directory_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAccountSubscriptionOutput {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub signup_response: Option<SignupResponse>,
    /// HTTP status of the call; filled in by the client.
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAccountSubscriptionInput {
    pub aws_account_id: String,
}

/// Observed subscription attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_subscription_status: Option<String>,
    #[serde(default)]
    pub authentication_type: Option<String>,
    #[serde(default)]
    pub edition: Option<String>,
    #[serde(rename = "IAMIdentityCenterInstanceArn", default)]
    pub iam_identity_center_instance_arn: Option<String>,
    #[serde(default)]
    pub notification_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAccountSubscriptionOutput {
    #[serde(default)]
    pub account_info: Option<AccountInfo>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteAccountSubscriptionInput {
    pub aws_account_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteAccountSubscriptionOutput {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}
