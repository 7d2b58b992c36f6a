//! Configuration management for the command-line client.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nebula_client::ClientConfig;
use serde::Deserialize;

use crate::cli::Args;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoint and credentials
    pub client: ClientConfig,
    /// Logging configuration
    pub log: LogConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Emit JSON log lines instead of the human format
    pub json: bool,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse config file")?;

        Ok(config)
    }

    /// Pick the configuration for a run.
    ///
    /// An explicit path must load. The default path is used when it exists
    /// and must then load too; only a missing default falls back to the
    /// environment. `ONE_AUTH` fills in credentials a file leaves unset.
    /// Returns the file the configuration came from, if any.
    pub fn resolve(explicit: Option<&str>) -> Result<(Self, Option<PathBuf>)> {
        Self::resolve_from(explicit.map(PathBuf::from), Self::default_path())
    }

    fn resolve_from(
        explicit: Option<PathBuf>,
        default: Option<PathBuf>,
    ) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => path,
            None => match default.filter(|path| path.exists()) {
                Some(path) => path,
                None => return Ok((Self::from_env(), None)),
            },
        };

        let mut config = Self::load(&path)?;
        config.client = config.client.with_env_defaults();
        Ok((config, Some(path)))
    }

    /// Configuration from `ONE_XMLRPC`/`ONE_AUTH` when no file is present.
    pub fn from_env() -> Self {
        Self {
            client: ClientConfig::from_env(),
            ..Default::default()
        }
    }

    /// `$HOME/.one/nebula.yaml`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".one").join("nebula.yaml"))
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if let Some(ref endpoint) = args.endpoint {
            self.client.endpoint = endpoint.clone();
        }

        if let Some(ref credentials) = args.credentials {
            self.client.credentials = Some(credentials.clone());
        }

        if let Some(timeout) = args.timeout {
            self.client.timeout_secs = Some(timeout);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "client:\n  endpoint: http://frontend:2633/RPC2\n  credentials: oneadmin:secret\nlog:\n  json: true\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.client.endpoint, "http://frontend:2633/RPC2");
        assert_eq!(config.client.token().unwrap(), "oneadmin:secret");
        assert!(config.log.json);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "client: [not, a, map").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_resolve_missing_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();

        let (config, source) = Config::resolve_from(None, Some(dir.path().join("nebula.yaml"))).unwrap();
        assert_eq!(source, None);
        assert!(!config.log.json);
    }

    #[test]
    fn test_resolve_malformed_default_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nebula.yaml");
        std::fs::write(&path, "client: [not, a, map").unwrap();

        assert!(Config::resolve_from(None, Some(path)).is_err());
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.yaml");
        let default = dir.path().join("nebula.yaml");
        std::fs::write(&explicit, "client:\n  credentials: alice:pw\n").unwrap();
        std::fs::write(&default, "client: [broken").unwrap();

        let (config, source) = Config::resolve_from(Some(explicit.clone()), Some(default)).unwrap();
        assert_eq!(source, Some(explicit));
        assert_eq!(config.client.credentials.as_deref(), Some("alice:pw"));

        assert!(Config::resolve_from(Some(dir.path().join("absent.yaml")), None).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::try_parse_from([
            "nebula",
            "--endpoint",
            "http://other:2633/RPC2",
            "--credentials",
            "alice:pw",
            "--timeout",
            "15",
            "version",
        ])
        .unwrap();

        let config = Config::default().with_cli_overrides(&args);
        assert_eq!(config.client.endpoint, "http://other:2633/RPC2");
        assert_eq!(config.client.credentials.as_deref(), Some("alice:pw"));
        assert_eq!(config.client.timeout_secs, Some(15));
    }
}
