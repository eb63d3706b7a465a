//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! AWS credentials come from the standard `AWS_*` env vars or from
//! `credentials_file`, never from the main TOML, so secrets stay out of it.

use common::Secret;
use provider::TimeoutOverrides;
use quicksight_api::Credentials;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ACCOUNT_ID_ENV: &str = "AWS_ACCOUNT_ID";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub aws: AwsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Per-operation default timeout overrides, in seconds.
    #[serde(default)]
    pub timeouts: TimeoutOverrides,
}

/// Control-plane settings
#[derive(Debug, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    /// Ambient account: owner of subscriptions that don't name one.
    #[serde(default)]
    pub account_id: String,
    /// Override of the regional endpoint, e.g. a local stand-in.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// TOML file holding `access_key_id`, `secret_access_key` and optionally
    /// `session_token`. Used when the env vars are not set.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Deserialize)]
struct CredentialsFile {
    access_key_id: String,
    secret_access_key: Secret<String>,
    #[serde(default)]
    session_token: Option<Secret<String>>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8787))
}

fn default_max_connections() -> usize {
    64
}

fn is_account_id(value: &str) -> bool {
    value.len() == 12 && value.bytes().all(|b| b.is_ascii_digit())
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Credential resolution order:
    /// 1. AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY (+ AWS_SESSION_TOKEN)
    /// 2. credentials_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(account_id) = std::env::var(ACCOUNT_ID_ENV) {
            let account_id = account_id.trim();
            if !account_id.is_empty() {
                config.aws.account_id = account_id.to_owned();
            }
        }

        config.aws.credentials = match Credentials::from_env() {
            Some(creds) => Some(creds),
            None => match &config.aws.credentials_file {
                Some(file) => Some(read_credentials_file(file)?),
                None => None,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.aws.region.trim().is_empty() {
            return Err(common::Error::invalid("aws.region", "must not be empty"));
        }

        if !is_account_id(&self.aws.account_id) {
            return Err(common::Error::invalid(
                "aws.account_id",
                format!(
                    "must be 12 digits (set it in the file or via {ACCOUNT_ID_ENV}), got {:?}",
                    self.aws.account_id
                ),
            ));
        }

        if let Some(endpoint) = &self.aws.endpoint
            && !endpoint.starts_with("http://")
            && !endpoint.starts_with("https://")
        {
            return Err(common::Error::invalid(
                "aws.endpoint",
                format!("must start with http:// or https://, got: {endpoint}"),
            ));
        }

        if self.aws.credentials.is_none() {
            return Err(common::Error::Config(
                "no AWS credentials: set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY or aws.credentials_file"
                    .into(),
            ));
        }

        if self.server.max_connections == 0 {
            return Err(common::Error::invalid(
                "server.max_connections",
                "must be greater than 0",
            ));
        }

        for (field, value) in [
            ("timeouts.create", self.timeouts.create),
            ("timeouts.read", self.timeouts.read),
            ("timeouts.delete", self.timeouts.delete),
        ] {
            if value == Some(0) {
                return Err(common::Error::invalid(field, "must be greater than 0"));
            }
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("quicksight-provider.toml")
    }
}

fn read_credentials_file(path: &Path) -> common::Result<Credentials> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        common::Error::Config(format!(
            "failed to read credentials_file {}: {e}",
            path.display()
        ))
    })?;
    let file: CredentialsFile = toml::from_str(&contents)?;
    let access_key_id = file.access_key_id.trim().to_owned();
    if access_key_id.is_empty() || file.secret_access_key.expose().trim().is_empty() {
        return Err(common::Error::Config(format!(
            "credentials_file {} has an empty key",
            path.display()
        )));
    }
    Ok(Credentials {
        access_key_id,
        secret_access_key: file.secret_access_key,
        session_token: file.session_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        ACCOUNT_ID_ENV,
        "CONFIG_PATH",
    ];

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_env() {
        for key in ENV_KEYS {
            unsafe { remove_env(key) };
        }
    }

    fn env_credentials() {
        unsafe { set_env("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE") };
        unsafe { set_env("AWS_SECRET_ACCESS_KEY", "env-secret") };
    }

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn valid_toml() -> &'static str {
        r#"
[aws]
region = "us-east-1"
account_id = "123456789012"

[server]
listen_addr = "127.0.0.1:9000"
"#
    }

    #[test]
    fn test_load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.toml", valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.aws.account_id, "123456789012");
        assert_eq!(config.aws.endpoint, None);
        assert_eq!(config.server.listen_addr.port(), 9000);
        assert_eq!(config.server.max_connections, 64);
        assert_eq!(config.timeouts, TimeoutOverrides::default());
        let creds = config.aws.credentials.unwrap();
        assert_eq!(creds.access_key_id, "AKIDEXAMPLE");
        assert_eq!(creds.secret_access_key.expose(), "env-secret");
        assert!(creds.session_token.is_none());
        clear_env();
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.toml", "not valid {{{{ toml");
        assert!(matches!(
            Config::load(&path),
            Err(common::Error::Toml(_))
        ));
    }

    #[test]
    fn test_server_section_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "[aws]\nregion = \"eu-west-1\"\naccount_id = \"123456789012\"\n",
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.listen_addr, default_listen_addr());
        assert_eq!(config.server.max_connections, 64);
        clear_env();
    }

    #[test]
    fn test_account_id_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        unsafe { set_env(ACCOUNT_ID_ENV, "999999999999") };
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.toml", valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.aws.account_id, "999999999999");
        clear_env();
    }

    #[test]
    fn test_invalid_account_id_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "[aws]\nregion = \"us-east-1\"\naccount_id = \"12345\"\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(
            matches!(err, common::Error::Invalid { field: "aws.account_id", .. }),
            "got {err}"
        );
        clear_env();
    }

    #[test]
    fn test_empty_region_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "[aws]\nregion = \"\"\naccount_id = \"123456789012\"\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, common::Error::Invalid { field: "aws.region", .. }));
        clear_env();
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "[aws]\nregion = \"us-east-1\"\naccount_id = \"123456789012\"\nendpoint = \"quicksight.local\"\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, common::Error::Invalid { field: "aws.endpoint", .. }));
        clear_env();
    }

    #[test]
    fn test_credentials_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let creds_path = write(
            &dir,
            "credentials.toml",
            "access_key_id = \"AKIDFILE\"\nsecret_access_key = \"file-secret\"\nsession_token = \"file-token\"\n",
        );
        let toml_content = format!(
            "[aws]\nregion = \"us-east-1\"\naccount_id = \"123456789012\"\ncredentials_file = \"{}\"\n",
            creds_path.display()
        );
        let path = write(&dir, "config.toml", &toml_content);

        let config = Config::load(&path).unwrap();
        let creds = config.aws.credentials.unwrap();
        assert_eq!(creds.access_key_id, "AKIDFILE");
        assert_eq!(creds.secret_access_key.expose(), "file-secret");
        assert_eq!(creds.session_token.unwrap().expose(), "file-token");
    }

    #[test]
    fn test_env_credentials_override_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        unsafe { set_env("AWS_SESSION_TOKEN", "env-token") };
        let dir = tempfile::tempdir().unwrap();
        let creds_path = write(
            &dir,
            "credentials.toml",
            "access_key_id = \"AKIDFILE\"\nsecret_access_key = \"file-secret\"\n",
        );
        let toml_content = format!(
            "[aws]\nregion = \"us-east-1\"\naccount_id = \"123456789012\"\ncredentials_file = \"{}\"\n",
            creds_path.display()
        );
        let path = write(&dir, "config.toml", &toml_content);

        let config = Config::load(&path).unwrap();
        let creds = config.aws.credentials.unwrap();
        assert_eq!(creds.access_key_id, "AKIDEXAMPLE");
        assert_eq!(creds.session_token.unwrap().expose(), "env-token");
        clear_env();
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.toml", valid_toml());

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("no AWS credentials"), "got {err}");
    }

    #[test]
    fn test_timeout_overrides_parsed_and_validated() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "[aws]\nregion = \"us-east-1\"\naccount_id = \"123456789012\"\n\n[timeouts]\ncreate = 1200\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.timeouts.create, Some(1200));
        assert_eq!(config.timeouts.delete, None);

        let path = write(
            &dir,
            "zero.toml",
            "[aws]\nregion = \"us-east-1\"\naccount_id = \"123456789012\"\n\n[timeouts]\ndelete = 0\n",
        );
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, common::Error::Invalid { field: "timeouts.delete", .. }));
        clear_env();
    }

    #[test]
    fn test_zero_max_connections_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        env_credentials();
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "[aws]\nregion = \"us-east-1\"\naccount_id = \"123456789012\"\n\n[server]\nmax_connections = 0\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(
            err,
            common::Error::Invalid { field: "server.max_connections", .. }
        ));
        clear_env();
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = Config::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, PathBuf::from("/custom/path.toml"));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("quicksight-provider.toml"));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }
}
