//! Per-invocation state shared by every command

use std::sync::Arc;

use github_api::{RestClient, authenticated_client};
use github_auth::{CredentialManager, PlatformPaths, VaultBackend};

use crate::config::Config;
use crate::error::Result;
use crate::output::OutputFormat;

pub struct App {
    pub config: Config,
    pub credentials: CredentialManager,
}

impl App {
    pub fn new(config: Config, paths: &dyn PlatformPaths, backend: Arc<dyn VaultBackend>) -> Result<Self> {
        let credentials = CredentialManager::new(config.credential_config(paths)?, backend);
        Ok(Self {
            config,
            credentials,
        })
    }

    /// A client holding whatever token is stored right now.
    pub async fn client(&self) -> Result<RestClient> {
        Ok(authenticated_client(&self.credentials, &self.config.client_config()).await?)
    }

    pub fn format(&self, json_flag: bool) -> OutputFormat {
        OutputFormat::select(json_flag, self.config.output.format)
    }
}
