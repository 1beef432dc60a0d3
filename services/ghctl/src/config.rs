//! Configuration types and loading
//!
//! Config precedence: `--config` > `GHCTL_CONFIG` > `<config dir>/ghctl/config.toml`.
//! `GITHUB_API_URL` overrides `api.base_url` after the file is read.
//! The token itself is never read from the TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::env;
use github_api::{ClientConfig, DEFAULT_API_URL};
use github_auth::{APP_NAME, CredentialConfig, PlatformPaths, VAULT_ACCOUNT, VAULT_SERVICE};
use serde::Deserialize;

use crate::output::OutputFormat;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api: ApiConfig,
    pub output: OutputConfig,
    pub credentials: CredentialsConfig,
}

/// GitHub REST settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Keyring identity and token file location
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub service: String,
    pub account: String,
    /// Overrides the platform token path
    pub token_file: Option<PathBuf>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            service: VAULT_SERVICE.to_string(),
            account: VAULT_ACCOUNT.to_string(),
            token_file: None,
        }
    }
}

/// Where the config file was looked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath {
    pub path: PathBuf,
    /// Named by flag or env var; a missing file is then an error.
    pub explicit: bool,
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| common::Error::read(path, e))?;
        let config: Config =
            toml::from_str(&contents).map_err(|e| common::Error::parse(path, e))?;
        config.finish()
    }

    /// Load the resolved config file, or defaults when the default file is absent.
    pub fn load_or_default(location: Option<&ConfigPath>) -> common::Result<Self> {
        match location {
            Some(loc) if loc.explicit || loc.path.exists() => Self::load(&loc.path),
            _ => Config::default().finish(),
        }
    }

    fn finish(mut self) -> common::Result<Self> {
        if let Some(url) = env::non_empty_var("GITHUB_API_URL") {
            self.api.base_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Invalid(format!(
                "api.base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(common::Error::Invalid(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.credentials.service.trim().is_empty() || self.credentials.account.trim().is_empty()
        {
            return Err(common::Error::Invalid(
                "credentials.service and credentials.account must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolve config file path from CLI arg, `GHCTL_CONFIG`, or the platform default.
    pub fn resolve_path(cli_path: Option<&str>, paths: &dyn PlatformPaths) -> Option<ConfigPath> {
        if let Some(p) = cli_path {
            return Some(ConfigPath {
                path: PathBuf::from(p),
                explicit: true,
            });
        }
        if let Some(p) = env::non_empty_var("GHCTL_CONFIG") {
            return Some(ConfigPath {
                path: PathBuf::from(p),
                explicit: true,
            });
        }
        paths.app_dir(APP_NAME).map(|dir| ConfigPath {
            path: dir.join(CONFIG_FILE_NAME),
            explicit: false,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            user_agent: self.api.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    pub fn credential_config(&self, paths: &dyn PlatformPaths) -> github_auth::Result<CredentialConfig> {
        let token_path = match &self.credentials.token_file {
            Some(path) => path.clone(),
            None => CredentialConfig::for_platform(paths)?.token_path,
        };
        Ok(CredentialConfig::new(
            self.credentials.service.clone(),
            self.credentials.account.clone(),
            token_path,
        ))
    }
}
