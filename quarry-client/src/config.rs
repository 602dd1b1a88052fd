//! Client configuration.

use crate::error::{Error, Result};
use quarry_transport::{TransportConfig, Url};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the cluster.
    pub url: String,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Per-exchange timeout enforced by the transport.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Default deadline for async calls, enforced by the dispatcher.
    pub call_timeout: Option<Duration>,
    /// User agent header.
    pub user_agent: Option<String>,
    /// Accept gzip-compressed replies.
    pub compression: bool,
}

impl ClientConfig {
    /// Create a configuration for a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            call_timeout: None,
            user_agent: None,
            compression: true,
        }
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the default deadline of async calls.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Enable or disable compression.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Load from `QUARRY_*` environment variables, reading `.env` first.
    ///
    /// Unset variables keep their defaults; `QUARRY_URL` defaults to
    /// `http://localhost:9200`.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from variables resolved by `lookup`.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("QUARRY_URL") {
            config.url = url;
        }
        config.username = lookup("QUARRY_USERNAME");
        config.password = lookup("QUARRY_PASSWORD");
        if let Some(value) = lookup("QUARRY_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = seconds("QUARRY_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("QUARRY_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = seconds("QUARRY_CONNECT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("QUARRY_CALL_TIMEOUT_SECS") {
            config.call_timeout = Some(seconds("QUARRY_CALL_TIMEOUT_SECS", &value)?);
        }
        config.user_agent = lookup("QUARRY_USER_AGENT");
        if let Some(value) = lookup("QUARRY_COMPRESSION") {
            config.compression = flag("QUARRY_COMPRESSION", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    ///
    /// ```toml
    /// url = "https://search.internal:9200"
    /// username = "ingest"
    /// password = "secret"
    /// request_timeout_secs = 60
    /// call_timeout_secs = 90
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("invalid TOML configuration: {}", e)))?;
        let config = file.into_config();
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_toml_str(&content)
    }

    /// Check that the configuration can produce a transport.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("invalid URL `{}`: {}", self.url, e)))?;

        if self.username.is_some() != self.password.is_some() {
            return Err(Error::Config(
                "username and password must be set together".to_string(),
            ));
        }
        Ok(())
    }

    /// Lower into the transport's configuration.
    pub fn transport_config(&self) -> TransportConfig {
        let mut builder = TransportConfig::builder()
            .base_url(self.url.clone())
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .gzip(self.compression);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            builder = builder.basic_auth(user.clone(), pass.clone());
        }

        builder.build()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:9200")
    }
}

fn seconds(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::Config(format!("{} must be whole seconds, got `{}`", key, value)))
}

fn flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean, got `{}`", key, value))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    call_timeout_secs: Option<u64>,
    user_agent: Option<String>,
    compression: Option<bool>,
}

impl FileConfig {
    fn into_config(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            url: self.url.unwrap_or(defaults.url),
            username: self.username,
            password: self.password,
            request_timeout: self
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            connect_timeout: self
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            call_timeout: self.call_timeout_secs.map(Duration::from_secs),
            user_agent: self.user_agent,
            compression: self.compression.unwrap_or(defaults.compression),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::collections::HashMap;

    // Environment mutation is unsafe under parallel tests, so loading goes
    // through an injected lookup.
    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.url, "http://localhost:9200");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.compression);
        assert!(config.call_timeout.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("QUARRY_URL", "https://search:9200"),
            ("QUARRY_USERNAME", "ingest"),
            ("QUARRY_PASSWORD", "secret"),
            ("QUARRY_REQUEST_TIMEOUT_SECS", "60"),
            ("QUARRY_CALL_TIMEOUT_SECS", "90"),
            ("QUARRY_COMPRESSION", "off"),
        ]))
        .unwrap();

        assert_eq!(config.url, "https://search:9200");
        assert_eq!(config.username.as_deref(), Some("ingest"));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.call_timeout, Some(Duration::from_secs(90)));
        assert!(!config.compression);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = ClientConfig::from_lookup(lookup(&[("QUARRY_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ClientConfig::from_lookup(lookup(&[("QUARRY_URL", "not a url")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ClientConfig::from_lookup(lookup(&[("QUARRY_USERNAME", "only-me")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_from_toml_str() {
        let config = ClientConfig::from_toml_str(
            r#"
            url = "https://search.internal:9200"
            username = "ingest"
            password = "secret"
            connect_timeout_secs = 3
            user_agent = "ingest-bot/1.0"
            "#,
        )
        .unwrap();

        assert_eq!(config.url, "https://search.internal:9200");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent.as_deref(), Some("ingest-bot/1.0"));
    }

    #[test]
    fn test_toml_unknown_key_rejected() {
        let err = ClientConfig::from_toml_str("max_retries = 3").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::from_file("/nonexistent/quarry.toml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_transport_config() {
        let transport = ClientConfig::new("http://search:9200")
            .with_basic_auth("user", "pass")
            .with_request_timeout(Duration::from_secs(5))
            .with_compression(false)
            .transport_config();

        assert_eq!(transport.base_url, "http://search:9200");
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert!(!transport.gzip);
        assert_eq!(
            transport.basic_auth,
            Some(("user".to_string(), "pass".to_string()))
        );
    }
}
