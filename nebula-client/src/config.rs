//! Client configuration: endpoint, credentials and transport timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:2633/RPC2";

/// Environment variable holding the endpoint URL.
pub const ENDPOINT_ENV: &str = "ONE_XMLRPC";

/// Environment variable holding the path of the credentials file.
pub const AUTH_FILE_ENV: &str = "ONE_AUTH";

/// Connection settings for [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// XML-RPC endpoint URL
    pub endpoint: String,
    /// Session token in `user:password` form (takes precedence over `auth_file`)
    pub credentials: Option<String>,
    /// File whose first line holds the session token
    pub auth_file: Option<PathBuf>,
    /// Per-request timeout in seconds, unbounded when unset
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials: None,
            auth_file: None,
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from `ONE_XMLRPC` and `ONE_AUTH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(path) = lookup(AUTH_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            config.auth_file = Some(PathBuf::from(path.trim()));
        }
        config
    }

    /// Fill settings left unset from `ONE_AUTH`.
    ///
    /// Values already present (e.g. from a config file) win; only a
    /// configuration without credentials or auth file picks up `ONE_AUTH`.
    pub fn with_env_defaults(self) -> Self {
        self.with_lookup_defaults(|key| std::env::var(key).ok())
    }

    fn with_lookup_defaults(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.credentials.is_none() && self.auth_file.is_none() {
            self.auth_file = Self::from_lookup(lookup).auth_file;
        }
        self
    }

    /// Set explicit credentials.
    pub fn with_credentials(mut self, user: &str, password: &str) -> Self {
        self.credentials = Some(format!("{}:{}", user, password));
        self
    }

    /// Read credentials from `path`.
    pub fn with_auth_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth_file = Some(path.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Resolve the session token.
    ///
    /// Explicit credentials win; otherwise the first line of the auth file
    /// (`$HOME/.one/one_auth` when none is configured) is used.
    pub fn token(&self) -> Result<String> {
        if let Some(credentials) = self.credentials.as_deref().filter(|c| !c.is_empty()) {
            return validate_token(credentials, "credentials");
        }

        let path = match &self.auth_file {
            Some(path) => path.clone(),
            None => default_auth_file().ok_or_else(|| {
                ClientError::Config("no credentials given and HOME is not set".to_string())
            })?,
        };
        read_token(&path)
    }
}

fn default_auth_file() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".one").join("one_auth"))
}

fn read_token(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ClientError::Config(format!("failed to read auth file {}: {}", path.display(), e))
    })?;
    let line = content.lines().next().unwrap_or_default().trim();
    validate_token(line, &path.display().to_string())
}

fn validate_token(token: &str, source: &str) -> Result<String> {
    match token.split_once(':') {
        Some((user, secret)) if !user.is_empty() && !secret.is_empty() => Ok(token.to_string()),
        _ => Err(ClientError::Config(format!(
            "{} must be in the form user:password",
            source
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(|key| match key {
            ENDPOINT_ENV => Some("http://frontend:2633/RPC2".to_string()),
            AUTH_FILE_ENV => Some("/tmp/one_auth".to_string()),
            _ => None,
        });
        assert_eq!(config.endpoint, "http://frontend:2633/RPC2");
        assert_eq!(config.auth_file, Some(PathBuf::from("/tmp/one_auth")));

        let empty = ClientConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(empty, ClientConfig::default());
    }

    #[test]
    fn test_env_fills_missing_auth_file() {
        let lookup = |key: &str| match key {
            AUTH_FILE_ENV => Some("/run/secrets/one_auth".to_string()),
            ENDPOINT_ENV => Some("http://ignored:2633/RPC2".to_string()),
            _ => None,
        };

        let from_file = ClientConfig::new("http://frontend:2633/RPC2").with_lookup_defaults(lookup);
        assert_eq!(from_file.auth_file, Some(PathBuf::from("/run/secrets/one_auth")));
        assert_eq!(from_file.endpoint, "http://frontend:2633/RPC2");

        let with_file = ClientConfig::default()
            .with_auth_file("/etc/one/auth")
            .with_lookup_defaults(lookup);
        assert_eq!(with_file.auth_file, Some(PathBuf::from("/etc/one/auth")));

        let with_credentials = ClientConfig::default()
            .with_credentials("oneadmin", "secret")
            .with_lookup_defaults(lookup);
        assert_eq!(with_credentials.auth_file, None);
    }

    #[test]
    fn test_explicit_credentials() {
        let config = ClientConfig::default().with_credentials("oneadmin", "secret");
        assert_eq!(config.token().unwrap(), "oneadmin:secret");

        let bad = ClientConfig {
            credentials: Some("oneadmin".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad.token(), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_token_from_auth_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "serveradmin:abc123").unwrap();
        writeln!(file, "ignored").unwrap();

        let config = ClientConfig::default().with_auth_file(file.path());
        assert_eq!(config.token().unwrap(), "serveradmin:abc123");
    }

    #[test]
    fn test_missing_auth_file() {
        let config = ClientConfig::default().with_auth_file("/nonexistent/one_auth");
        assert!(matches!(config.token(), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_yaml_deserialize_partial() {
        let config: ClientConfig = serde_yaml::from_str("endpoint: http://x:2633/RPC2\ntimeout_secs: 30\n").unwrap();
        assert_eq!(config.endpoint, "http://x:2633/RPC2");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.credentials, None);
    }
}
