//! AWS credentials used to sign control-plane requests

use common::Secret;

pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Static access key pair, optionally with a session token.
///
/// The secret key and session token are wrapped in `Secret` so they never
/// show up in logs or debug output.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: Secret<String>,
    pub session_token: Option<Secret<String>>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: Secret::new(secret_access_key.into()),
            session_token: session_token.map(Secret::new),
        }
    }

    /// Load from the standard environment variables. Returns `None` unless
    /// both the key id and the secret key are set.
    pub fn from_env() -> Option<Self> {
        let access_key_id = std::env::var(ACCESS_KEY_ID_ENV)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())?;
        let secret_access_key = Secret::from_env(SECRET_ACCESS_KEY_ENV)?;
        Some(Self {
            access_key_id,
            secret_access_key,
            session_token: Secret::from_env(SESSION_TOKEN_ENV),
        })
    }
}
