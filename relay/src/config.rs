use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

pub const WEBHOOK_TOKEN_VAR: &str = "WEBHOOK_TOKEN";
pub const GOTIFY_TOKEN_VAR: &str = "GOTIFY_TOKEN";
pub const GOTIFY_URL_VAR: &str = "GOTIFY_URL";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Route prefix must start and end with '/': {0}")]
    InvalidRoutePrefix(String),

    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,

    #[error("Maximum body size cannot be 0")]
    InvalidBodyLimit,
}

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("{0} environment variable not set")]
    MissingVariable(&'static str),

    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("{0} must use the http or https scheme")]
    UnsupportedScheme(&'static str),
}

/// Relay configuration
///
/// Every field has a default, so an empty `relay` section (or none at all)
/// listens on port 8000 and serves the webhook under `/receive/`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Listener for incoming webhook calls
    pub listener: Listener,
    /// Listener for the health and readiness endpoints
    pub admin_listener: Listener,
    /// Path prefix the webhook is served under
    pub route_prefix: String,
    /// Bound on the whole outbound call to Gotify
    pub upstream_timeout_secs: u64,
    /// Largest accepted form body
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener {
                host: "0.0.0.0".into(),
                port: 8000,
            },
            admin_listener: Listener {
                host: "127.0.0.1".into(),
                port: 8001,
            },
            route_prefix: "/receive/".into(),
            upstream_timeout_secs: 10,
            max_body_bytes: 10 << 20,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if !self.route_prefix.starts_with('/') || !self.route_prefix.ends_with('/') {
            return Err(ValidationError::InvalidRoutePrefix(
                self.route_prefix.clone(),
            ));
        }

        if self.upstream_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if self.max_body_bytes == 0 {
            return Err(ValidationError::InvalidBodyLimit);
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Secrets and the Gotify endpoint, read once from the environment at startup.
#[derive(Clone)]
pub struct Credentials {
    /// Token callers must present in the `token` query parameter
    pub webhook_token: String,
    /// Gotify application token
    pub gotify_token: String,
    /// Base URL of the Gotify server
    pub gotify_url: Url,
}

impl Credentials {
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from an arbitrary variable source. Unset and empty
    /// variables are both treated as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(CredentialsError::MissingVariable(name))
        };

        let webhook_token = require(WEBHOOK_TOKEN_VAR)?;
        let gotify_token = require(GOTIFY_TOKEN_VAR)?;
        let gotify_url = Url::parse(&require(GOTIFY_URL_VAR)?).map_err(|source| {
            CredentialsError::InvalidUrl {
                var: GOTIFY_URL_VAR,
                source,
            }
        })?;

        if !matches!(gotify_url.scheme(), "http" | "https") {
            return Err(CredentialsError::UnsupportedScheme(GOTIFY_URL_VAR));
        }

        Ok(Credentials {
            webhook_token,
            gotify_token,
            gotify_url,
        })
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("webhook_token", &"<redacted>")
            .field("gotify_token", &"<redacted>")
            .field("gotify_url", &self.gotify_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
listener:
    host: "127.0.0.1"
    port: 9000
route_prefix: /hooks/sms/
upstream_timeout_secs: 3
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.route_prefix, "/hooks/sms/");
        assert_eq!(config.upstream_timeout_secs, 3);

        // Unset keys keep their defaults
        assert_eq!(config.admin_listener, Config::default().admin_listener);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.listener.port, 8000);
        assert_eq!(config.route_prefix, "/receive/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = Config::default();
        config.route_prefix = "/receive".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidRoutePrefix(_)
        ));

        let mut config = Config::default();
        config.route_prefix = "receive/".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidRoutePrefix(_)
        ));

        let mut config = Config::default();
        config.upstream_timeout_secs = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidTimeout
        ));

        let mut config = Config::default();
        config.max_body_bytes = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidBodyLimit
        ));
    }

    #[test]
    fn test_credentials() {
        let credentials = Credentials::from_lookup(lookup_from(&[
            ("WEBHOOK_TOKEN", "secret123"),
            ("GOTIFY_TOKEN", "dtok"),
            ("GOTIFY_URL", "http://notify.local"),
        ]))
        .unwrap();

        assert_eq!(credentials.webhook_token, "secret123");
        assert_eq!(credentials.gotify_token, "dtok");
        assert_eq!(credentials.gotify_url.host_str(), Some("notify.local"));

        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret123"));
        assert!(!debug.contains("dtok"));
    }

    #[test]
    fn test_missing_credentials() {
        let result = Credentials::from_lookup(lookup_from(&[
            ("GOTIFY_TOKEN", "dtok"),
            ("GOTIFY_URL", "http://notify.local"),
        ]));
        assert!(matches!(
            result.unwrap_err(),
            CredentialsError::MissingVariable("WEBHOOK_TOKEN")
        ));

        // Empty counts as unset
        let result = Credentials::from_lookup(lookup_from(&[
            ("WEBHOOK_TOKEN", "secret123"),
            ("GOTIFY_TOKEN", ""),
            ("GOTIFY_URL", "http://notify.local"),
        ]));
        assert!(matches!(
            result.unwrap_err(),
            CredentialsError::MissingVariable("GOTIFY_TOKEN")
        ));

        let result = Credentials::from_lookup(lookup_from(&[
            ("WEBHOOK_TOKEN", "secret123"),
            ("GOTIFY_TOKEN", "dtok"),
        ]));
        assert!(matches!(
            result.unwrap_err(),
            CredentialsError::MissingVariable("GOTIFY_URL")
        ));
    }

    #[test]
    fn test_invalid_gotify_url() {
        let result = Credentials::from_lookup(lookup_from(&[
            ("WEBHOOK_TOKEN", "secret123"),
            ("GOTIFY_TOKEN", "dtok"),
            ("GOTIFY_URL", "notify.local"),
        ]));
        assert!(matches!(
            result.unwrap_err(),
            CredentialsError::InvalidUrl { .. }
        ));

        let result = Credentials::from_lookup(lookup_from(&[
            ("WEBHOOK_TOKEN", "secret123"),
            ("GOTIFY_TOKEN", "dtok"),
            ("GOTIFY_URL", "ftp://notify.local"),
        ]));
        assert!(matches!(
            result.unwrap_err(),
            CredentialsError::UnsupportedScheme(_)
        ));
    }
}
